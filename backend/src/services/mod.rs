pub mod candidates;
pub mod export_service;
pub mod viral_service;
pub mod youtube;
