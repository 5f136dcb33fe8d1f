use axum::{
    routing::{get, post},
    Router,
    extract::{Json, Path, State},
    http::HeaderValue,
    response::{Html, IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::api::models::{CloneRequest, HealthResponse};
use crate::api::response;
use crate::error::AppError;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let cors = cors_layer(app_state.cors_origin.as_deref());

    Router::new()
        .route("/", get(health_handler))
        .route("/clone", post(clone_handler))
        .route("/clones", get(list_handler))
        .route("/clones/:filename", get(read_handler))
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS_ORIGIN: {}", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        message: "Website Cloning API is running",
    })
}

async fn clone_handler(
    State(state): State<AppState>,
    Json(req): Json<CloneRequest>,
) -> Response {
    info!("Processing clone request for URL: {}", req.url);
    let start_time = std::time::Instant::now();

    let result = tokio::time::timeout(state.request_timeout, state.pipeline.clone_site(&req.url)).await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(cloned)) => {
            info!("Cloned {} in {:?}", req.url, elapsed);
            response::success(cloned).into_response()
        }
        Ok(Err(err)) => {
            log_failure(&req.url, &err);
            err.into_response()
        }
        Err(_) => {
            error!("Clone of {} timed out after {:?}", req.url, elapsed);
            AppError::Timeout.into_response()
        }
    }
}

async fn list_handler(State(state): State<AppState>) -> Response {
    match state.pipeline.store().list().await {
        Ok(records) => response::success(records).into_response(),
        Err(err) => {
            error!("Listing clones failed: {}", err);
            err.into_response()
        }
    }
}

async fn read_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    match state.pipeline.store().read(&filename).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => err.into_response(),
    }
}

fn log_failure(url: &str, err: &AppError) {
    match err {
        AppError::ValidationError(_) | AppError::NotFoundError(_) => warn!("Rejected {}: {}", url, err),
        AppError::ScrapeError { .. } | AppError::GenerationError(_) | AppError::OversizeError { .. } => {
            warn!("Clone of {} failed: {}", url, err)
        }
        _ => error!("Clone of {} failed: {}", url, err),
    }
}
