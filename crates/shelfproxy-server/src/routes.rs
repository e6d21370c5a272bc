use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use plex_proxy_config::{AccessTokenProvider, FetchTuning, PlexSettings};
use plex_proxy_core::{handle_library_request, AggregateError, LibraryQuery};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Everything a request handler needs. Cheap to clone; nothing here is
/// mutated across requests.
#[derive(Clone)]
pub struct AppState {
    pub settings: PlexSettings,
    pub tuning: FetchTuning,
    pub tokens: Arc<dyn AccessTokenProvider>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/plex/library", get(plex_library))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LibraryParams {
    section: Option<String>,
    limit: Option<i64>,
}

const LIBRARY_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

async fn plex_library(
    State(state): State<AppState>,
    Query(params): Query<LibraryParams>,
) -> Response {
    let query = LibraryQuery {
        section: params.section,
        limit: params.limit,
    };

    match handle_library_request(&state.settings, &state.tuning, state.tokens.as_ref(), &query).await
    {
        Ok(payload) => {
            let mut response = Json(payload).into_response();
            response.headers_mut().insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(LIBRARY_CACHE_CONTROL),
            );
            response
        }
        Err(err) => error_response(err),
    }
}

/// Map the error taxonomy onto the wire contract: configuration and
/// connectivity problems are 503 with a displayable message, anything
/// else is a generic 500. Full detail stays in the server log.
fn error_response(err: AggregateError) -> Response {
    if err.is_unavailable() {
        info!("Plex library unavailable: {}", err);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"available": false, "message": err.to_string()})),
        )
            .into_response()
    } else {
        error!("Plex library request failed: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"available": false, "error": err.to_string()})),
        )
            .into_response()
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
