use crate::error::AnimError;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT_S: u64 = 600;

fn gemini_extract_candidate_text(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            warn!("Gemini error message: {}", msg);
        }
        if let Some(status) = err.get("status").and_then(|v| v.as_str()) {
            warn!("Gemini error status: {}", status);
        }
        return None;
    }

    let candidates = root.get("candidates")?.as_array()?;
    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(|v| v.get("parts"))
            .and_then(|v| v.as_array());
        if let Some(parts) = parts {
            for part in parts {
                if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                    return Some(text.to_string());
                }
            }
        }
    }

    None
}

/// Ask Gemini for Manim source for the given user prompt. Single-shot, no
/// streaming, no conversation state; the returned text is untrusted and goes
/// straight to the sanitizer.
pub async fn generate_scene_code(
    client: &Client,
    model: &str,
    api_key: &str,
    user_prompt: &str,
) -> Result<String, AnimError> {
    let prompt = format!("Generate Manim code to animate: {user_prompt}");
    let body = json!({
        "contents": [
            {"parts": [{"text": prompt}]},
        ],
    });

    let url = format!("{GEMINI_BASE}/{model}:generateContent");
    let resp = client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&body)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_S))
        .send()
        .await?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!("Gemini HTTP {}", status.as_u16());
        if !raw.is_empty() {
            let snippet = raw.chars().take(800).collect::<String>();
            warn!("Gemini raw body: {}", snippet);
        }
        return Err(AnimError::Generation(format!(
            "text generation HTTP {}",
            status.as_u16()
        )));
    }

    match gemini_extract_candidate_text(&raw) {
        Some(text) if !text.trim().is_empty() => {
            info!("Gemini completion received ({} bytes)", text.len());
            Ok(text)
        }
        _ => {
            warn!("Gemini response parse failed or empty.");
            if !raw.is_empty() {
                let snippet = raw.chars().take(800).collect::<String>();
                warn!("Gemini raw body: {}", snippet);
            }
            Err(AnimError::EmptyGeneration)
        }
    }
}
