use log::error;
use viral_topics::build_rocket;
use viral_topics::config::{
    create_app_state, create_cors, init_logger, load_environment, AppConfig,
};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    load_environment();
    init_logger();

    let config = AppConfig::from_env().map_err(|e| {
        error!("{e}");
        e
    })?;
    let state = create_app_state(&config)?;
    let cors = create_cors(&config)?;

    build_rocket(state)
        .attach(cors)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed to launch: {e}"))?;

    Ok(())
}
