use crate::api::gemini;
use crate::config::{Config, SERVICE_NAME};
use crate::error::{AnimError, ApiError};
use crate::renderer::{ManimRenderer, SceneRenderer};
use crate::sanitizer;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub renderer: Arc<dyn SceneRenderer>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        let renderer = Arc::new(ManimRenderer::new(&config));
        Ok(Arc::new(Self {
            config,
            http,
            renderer,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub video_url: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub api_key_configured: bool,
    pub service: &'static str,
}

/// POST /generate — prompt in, video path out.
///
/// The prompt is forwarded as-is (even when empty); the credential check is
/// the only local validation and happens before any outbound call.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let api_key = state
        .config
        .gemini_api_key
        .as_deref()
        .ok_or(AnimError::MissingApiKey)?;

    let raw = gemini::generate_scene_code(&state.http, &state.config.model, api_key, &req.user_prompt)
        .await?;

    let scene = sanitizer::sanitize(&raw);
    info!("sanitized scene: {}", scene.scene_name);

    let video_path = state
        .renderer
        .render(&scene.source, &scene.scene_name)
        .await
        .map_err(|err| ApiError(anyhow::Error::from(err).context("animation generation error")))?;

    Ok(Json(GenerateResponse {
        video_url: video_path.display().to_string(),
        status: "success",
    }))
}

/// GET /health — liveness plus configuration visibility.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        api_key_configured: state.config.gemini_api_key.is_some(),
        service: SERVICE_NAME,
    })
}

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let videos_dir = state.config.videos_dir.clone();

    Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health))
        .route_service("/", ServeFile::new("static/index.html"))
        .nest_service("/static", ServeDir::new("static"))
        .nest_service("/videos", ServeDir::new(videos_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
