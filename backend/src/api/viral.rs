use crate::error::ConfigError;
use crate::models::{CsvDownload, ErrorResponse, RunConfig, RunOutcome, ViralQuery, ViralReport};
use crate::services::export_service::{report_to_html, rows_to_csv, TableSort, EXPORT_FILENAME};
use crate::services::viral_service::run_viral_search;
use crate::AppState;
use chrono::Utc;
use log::{info, warn};
use rocket::http::uri::Origin;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, State};

fn invalid_parameters(e: ConfigError) -> ErrorResponse {
    warn!("Rejected run parameters: {e}");
    ErrorResponse::new(Status::BadRequest, "invalid_parameters", e.to_string())
}

async fn run(query: ViralQuery, state: &AppState) -> Result<ViralReport, ErrorResponse> {
    let config = RunConfig::from_query(query).map_err(invalid_parameters)?;
    info!(
        "Viral search over {} keywords, last {} days",
        config.keywords.len(),
        config.days
    );

    run_viral_search(state.platform.as_ref(), &config, Utc::now())
        .await
        .map_err(invalid_parameters)
}

#[get("/?<query..>")]
pub async fn viral_videos(
    query: ViralQuery,
    state: &State<AppState>,
) -> Result<Json<ViralReport>, ErrorResponse> {
    run(query, state).await.map(Json)
}

#[get("/table?<query..>")]
pub async fn viral_table(
    query: ViralQuery,
    uri: &Origin<'_>,
    state: &State<AppState>,
) -> Result<RawHtml<String>, ErrorResponse> {
    let sort = TableSort::parse(query.sort.as_deref(), query.order.as_deref())
        .map_err(invalid_parameters)?;
    let report = run(query, state).await?;

    let raw_query = uri.query().map(|q| q.as_str().to_string()).unwrap_or_default();
    Ok(RawHtml(report_to_html(&report, sort, &raw_query)))
}

#[get("/export?<query..>")]
pub async fn viral_export(
    query: ViralQuery,
    state: &State<AppState>,
) -> Result<CsvDownload, ErrorResponse> {
    let report = run(query, state).await?;
    if report.outcome != RunOutcome::Found {
        return Err(ErrorResponse::new(
            Status::NotFound,
            "no_results",
            report.message,
        ));
    }

    info!("Exporting {} rows as {EXPORT_FILENAME}", report.rows.len());
    Ok(CsvDownload {
        filename: EXPORT_FILENAME,
        body: rows_to_csv(&report.rows),
    })
}
