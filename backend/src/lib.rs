pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use rocket::{get, routes, Build, Rocket};
use services::youtube::VideoPlatform;
use std::sync::Arc;

pub struct AppState {
    pub platform: Arc<dyn VideoPlatform>,
}

#[get("/")]
fn index() -> &'static str {
    "Viral topics backend is running"
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/", routes![index])
        .mount(
            "/api/viral",
            routes![api::viral_videos, api::viral_table, api::viral_export],
        )
}
