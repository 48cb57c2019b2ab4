pub mod config;
pub mod fetcher;
pub mod github;
pub mod identity;
pub mod metrics;
pub mod report;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use config::AppConfig;
use github::GitHubClient;
use identity::RepositoryIdentity;
use report::RepoReport;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    /// Repository URL as typed by the user, e.g. `https://github.com/owner/repo`.
    pub url: String,
}

/// Shared application state accessible to all request handlers.
pub struct AppState {
    /// Client for the GitHub REST endpoints.
    pub client: GitHubClient,
    /// Application configuration loaded from environment variables.
    pub config: AppConfig,
}

impl AppState {
    /// Initializes the application state, including the GitHub client.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = GitHubClient::new(&config)?;
        Ok(Self { client, config })
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let static_dir = &state.config.static_dir;
    let serve_dir = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));

    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/report", get(get_report))
        .route("/api/repos/{owner}/{name}/report", get(get_repo_report))
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http());

    catch_panics(router).with_state(state)
}

/// Wraps every route so a panicking handler answers with a generic 500.
fn catch_panics<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(CatchPanicLayer::custom(handle_panic))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "repo-insight",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds a report from a free-text repository URL.
pub async fn get_report(
    query: Result<Query<ReportQuery>, QueryRejection>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RepoReport>, (StatusCode, Json<ErrorResponse>)> {
    let Query(query) = query.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.body_text(),
            }),
        )
    })?;

    let repo = RepositoryIdentity::parse(&query.url).map_err(|e| {
        tracing::info!(url = %query.url, "Rejected repository URL: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    Ok(Json(fetcher::fetch_report(&state.client, &repo).await))
}

pub async fn get_repo_report(
    Path(repo): Path<RepositoryIdentity>,
    State(state): State<Arc<AppState>>,
) -> Json<RepoReport> {
    tracing::debug!(repo = %repo, "Building report");
    Json(fetcher::fetch_report(&state.client, &repo).await)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal Server Error".to_string(),
        }),
    )
        .into_response()
}
