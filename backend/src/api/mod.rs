pub mod viral;

pub use viral::*;
