//! HTTP presentation: a JSON score endpoint and an HTML dashboard.
//!
//! Every request re-fetches the source, so the dashboard always reflects the
//! current upstream table.

mod dashboard;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::fetch::{current_year, Pipeline, Scored};
use crate::scoring::ScoreResult;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    as_of_year: Option<i32>,
}

impl AppState {
    /// `as_of_year` pins the scoring year; `None` uses the current year per request.
    pub fn new(pipeline: Pipeline, as_of_year: Option<i32>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            as_of_year,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScoresQuery {
    as_of: Option<i32>,
}

/// Error rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/scores", get(scores))
        .route("/health", get(health))
        .with_state(state)
}

async fn load(state: &AppState, as_of_year: i32) -> Result<Scored, ApiError> {
    match state.pipeline.fetch_and_score(as_of_year).await {
        Ok(Some(scored)) => Ok(scored),
        Ok(None) => Err(ApiError::not_found("No data available")),
        Err(e) => {
            let message = format!("{:#}", e);
            tracing::error!(error = %message, source = %state.pipeline.source, "Failed to score graft data");
            Err(ApiError::internal(message))
        }
    }
}

fn resolve_year(state: &AppState, query: &ScoresQuery) -> i32 {
    query
        .as_of
        .or(state.as_of_year)
        .unwrap_or_else(current_year)
}

async fn scores(
    State(state): State<AppState>,
    query: Result<Query<ScoresQuery>, QueryRejection>,
) -> Result<Json<ScoreResult>, ApiError> {
    let Query(query) = query?;
    let as_of_year = resolve_year(&state, &query);
    let scored = load(&state, as_of_year).await?;
    tracing::debug!(as_of_year, grafts = scored.report.result.len(), "Served scores");
    Ok(Json(scored.report.result))
}

async fn dashboard_page(
    State(state): State<AppState>,
    query: Result<Query<ScoresQuery>, QueryRejection>,
) -> (StatusCode, Html<String>) {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            let e = ApiError::from(rejection);
            return (e.status, Html(dashboard::render_error(&e.message)));
        }
    };
    let as_of_year = resolve_year(&state, &query);
    match load(&state, as_of_year).await {
        Ok(scored) => (StatusCode::OK, Html(dashboard::render(&scored, as_of_year))),
        Err(e) => (e.status, Html(dashboard::render_error(&e.message))),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Bind the listening socket.
pub async fn bind(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))
}

/// Serve requests on `listener` until the process is stopped.
pub async fn run(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    let source = state.pipeline.source.to_string();
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    let app = router(state);

    tracing::info!(%source, "Lindy score server listening on http://{}", addr);

    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "HTTP server error");
        anyhow::anyhow!("HTTP server error: {}", e)
    })?;

    tracing::info!("HTTP server shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use axum::body::Body;
    use axum::http::Request;
    use std::io::Write;
    use std::path::PathBuf;
    use tower::ServiceExt;

    async fn get_path(state: AppState, uri: &str) -> (StatusCode, String) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn fixture_state() -> AppState {
        AppState::new(Pipeline::new(Source::Fixture), Some(2024))
    }

    #[tokio::test]
    async fn test_scores_ok() {
        let (status, body) = get_path(fixture_state(), "/scores").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 4);
        let hamstring = map["hamstring"].as_f64().unwrap();
        assert!((hamstring - 158_865.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_scores_as_of_query() {
        let (status, body) = get_path(fixture_state(), "/scores?as_of=2010").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["achilles_allograft"], 0.0);
        assert!(value["hamstring"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_scores_malformed_as_of_is_json_400() {
        let (status, body) = get_path(fixture_state(), "/scores?as_of=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("as_of"));
    }

    #[tokio::test]
    async fn test_dashboard_malformed_as_of_is_400() {
        let (status, body) = get_path(fixture_state(), "/?as_of=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("class=\"error\""));
    }

    #[tokio::test]
    async fn test_scores_empty_table_is_404() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "graft_type,introduced,PRO").unwrap();
        let state = AppState::new(
            Pipeline::new(Source::File(file.path().to_path_buf())),
            Some(2024),
        );

        let (status, body) = get_path(state, "/scores").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["error"], "No data available");
    }

    #[tokio::test]
    async fn test_scores_source_failure_is_500() {
        let state = AppState::new(
            Pipeline::new(Source::File(PathBuf::from("/nonexistent/grafts.csv"))),
            Some(2024),
        );
        let (status, body) = get_path(state, "/scores").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_scores_invalid_data_is_500() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "graft_type,introduced,PRO").unwrap();
        writeln!(file, "hamstring,1990,85").unwrap();
        let state = AppState::new(
            Pipeline::new(Source::File(file.path().to_path_buf())),
            Some(2024),
        );

        let (status, body) = get_path(state, "/scores").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("LSI"));
    }

    #[tokio::test]
    async fn test_dashboard_renders_tables() {
        let (status, body) = get_path(fixture_state(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>ACL Grafts Lindy Scores</h1>"));
        assert!(body.contains("achilles_allograft"));
        assert!(body.contains("158865.00"));
    }

    #[tokio::test]
    async fn test_dashboard_error_banner() {
        let state = AppState::new(
            Pipeline::new(Source::File(PathBuf::from("/nonexistent/grafts.csv"))),
            Some(2024),
        );
        let (status, body) = get_path(state, "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("class=\"error\""));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_path(fixture_state(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
