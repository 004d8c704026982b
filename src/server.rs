use crate::config::AppConfig;
use crate::page;
use crate::processing;
use crate::types::{CountryShape, Observation};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Load-once cache for the process lifetime: the dataset is read and
/// aggregated exactly once at startup, and every request recomputes only
/// filter → geocode → render from here.
pub struct AppState {
    pub config: AppConfig,
    pub aggregated: Vec<Observation>,
    pub shapes: Vec<CountryShape>,
    pub available_years: Vec<i32>,
}

pub async fn start_server(
    config: AppConfig,
    aggregated: Vec<Observation>,
    shapes: Vec<CountryShape>,
) -> Result<()> {
    let available_years = processing::distinct_years(&aggregated);

    let port = config.server.port;
    let state = Arc::new(AppState {
        config,
        aggregated,
        shapes,
        available_years,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("serving dashboard on http://{}", addr);

    let app = Router::new()
        .route("/", get(dashboard_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let selected = selected_years(&params, &state.available_years);

    let html = page::build_dashboard(
        &state.config,
        &state.aggregated,
        &state.shapes,
        &state.available_years,
        &selected,
    )
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("dashboard render failed: {e:#}"),
        )
    })?;

    Ok(Html(html))
}

/// Repeated `year` query parameters pick the selection. No `year`
/// parameter at all means the form was never submitted, so every year is
/// selected, mirroring the sidebar default. A submitted form with nothing
/// checked sends `apply=1` alone and yields an empty selection.
fn selected_years(params: &[(String, String)], available: &[i32]) -> BTreeSet<i32> {
    if params.is_empty() {
        return available.iter().copied().collect();
    }
    params
        .iter()
        .filter(|(key, _)| key == "year")
        .filter_map(|(_, value)| value.parse().ok())
        .collect()
}
