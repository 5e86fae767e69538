use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure taxonomy for the generation pipeline.
#[derive(Debug, Error)]
pub enum AnimError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("text generation returned no content")]
    EmptyGeneration,

    #[error("renderer exited with {status}: {stderr}")]
    RendererFailed {
        status: i32,
        stdout: String,
        stderr: String,
    },

    #[error("renderer succeeded but produced no locatable output artifact")]
    ArtifactNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("text generation request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Unified error type for HTTP responses.
///
/// Every pipeline failure surfaces as `500 { "detail": .. }` with the
/// flattened context chain; nothing is retried and no partial result is
/// returned.
#[derive(Debug)]
pub struct ApiError(pub anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": format!("{:#}", self.0) });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_500() {
        let err = ApiError(AnimError::MissingApiKey.into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_body_is_json_detail() {
        let err = ApiError(AnimError::EmptyGeneration.into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }

    #[test]
    fn detail_flattens_context_chain() {
        let err: anyhow::Error = AnimError::ArtifactNotFound.into();
        let err = ApiError(err.context("animation generation error"));
        let text = format!("{:#}", err.0);
        assert!(text.starts_with("animation generation error"));
        assert!(text.contains("no locatable output artifact"));
    }
}
