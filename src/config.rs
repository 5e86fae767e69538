use crate::renderer::{OutputLayout, RenderQuality};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const SERVICE_NAME: &str = "visaire";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_RENDERER: &str = "manim";

/// Process configuration, built once at startup and passed to handlers.
///
/// A missing API key is allowed here: startup succeeds and each `/generate`
/// request fails with a configuration error instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub host: String,
    pub port: u16,
    pub renderer_command: String,
    pub quality: RenderQuality,
    pub layout: OutputLayout,
    pub work_dir: PathBuf,
    pub videos_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number, got {raw:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let quality = match env::var("RENDER_QUALITY") {
            Ok(raw) => raw.parse::<RenderQuality>()?,
            Err(_) => RenderQuality::default(),
        };

        let layout = match env::var("RENDER_LAYOUT") {
            Ok(raw) => raw.parse::<OutputLayout>()?,
            Err(_) => OutputLayout::default(),
        };

        Ok(Self {
            gemini_api_key,
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            renderer_command: env::var("RENDERER_COMMAND")
                .unwrap_or_else(|_| DEFAULT_RENDERER.to_string()),
            quality,
            layout,
            work_dir: PathBuf::from(env::var("WORK_DIR").unwrap_or_else(|_| ".".to_string())),
            videos_dir: PathBuf::from(
                env::var("VIDEOS_DIR").unwrap_or_else(|_| "videos".to_string()),
            ),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> Config {
        Config {
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            renderer_command: DEFAULT_RENDERER.to_string(),
            quality: RenderQuality::default(),
            layout: OutputLayout::default(),
            work_dir: PathBuf::from("."),
            videos_dir: PathBuf::from("videos"),
        }
    }

    #[test]
    fn missing_key_is_startup_safe() {
        let cfg = test_config();
        assert!(cfg.gemini_api_key.is_none());
    }
}
