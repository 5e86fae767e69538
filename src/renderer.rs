use crate::config::Config;
use crate::error::AnimError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Capability interface over the external rendering toolchain.
///
/// Implementations always return a deterministic target path regardless of
/// the renderer's internal output layout.
#[async_trait]
pub trait SceneRenderer: Send + Sync {
    async fn render(&self, source: &str, scene_name: &str) -> Result<PathBuf, AnimError>;
}

/// Quality flag passed to the renderer, and the resolution directory the
/// media-tree layout nests output under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderQuality {
    Low,
    Medium,
    High,
    #[default]
    FourK,
}

impl RenderQuality {
    pub fn flag(self) -> &'static str {
        match self {
            RenderQuality::Low => "-ql",
            RenderQuality::Medium => "-qm",
            RenderQuality::High => "-qh",
            RenderQuality::FourK => "-qk",
        }
    }

    fn media_dirname(self) -> &'static str {
        match self {
            RenderQuality::Low => "480p15",
            RenderQuality::Medium => "720p30",
            RenderQuality::High => "1080p60",
            RenderQuality::FourK => "2160p60",
        }
    }
}

impl FromStr for RenderQuality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(RenderQuality::Low),
            "m" | "medium" => Ok(RenderQuality::Medium),
            "h" | "high" => Ok(RenderQuality::High),
            "k" | "4k" => Ok(RenderQuality::FourK),
            other => anyhow::bail!("unknown render quality {other:?} (low|medium|high|4k)"),
        }
    }
}

/// Where the renderer deposits its output.
///
/// `Direct` expects the file at the requested output name in the work dir;
/// `MediaTree` expects it nested under `media/videos/<stem>/<resolution>/`
/// and falls back to a recursive walk of `media/` for any `.mp4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputLayout {
    Direct,
    #[default]
    MediaTree,
}

impl FromStr for OutputLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(OutputLayout::Direct),
            "media-tree" | "media_tree" | "media" => Ok(OutputLayout::MediaTree),
            other => anyhow::bail!("unknown render layout {other:?} (direct|media-tree)"),
        }
    }
}

/// Invokes the Manim CLI as a subprocess, one blocking call per request.
pub struct ManimRenderer {
    command: String,
    quality: RenderQuality,
    layout: OutputLayout,
    work_dir: PathBuf,
    videos_dir: PathBuf,
}

/// Removes the temporary source file on every exit path, including panics
/// and cancelled futures.
struct TempSource(PathBuf);

impl Drop for TempSource {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl ManimRenderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            command: cfg.renderer_command.clone(),
            quality: cfg.quality,
            layout: cfg.layout,
            work_dir: cfg.work_dir.clone(),
            videos_dir: cfg.videos_dir.clone(),
        }
    }

    fn media_dir(&self) -> PathBuf {
        self.work_dir.join("media")
    }

    /// Locate the produced artifact and relocate it to `target`.
    async fn collect_artifact(
        &self,
        source_name: &str,
        video_name: &str,
        target: &Path,
    ) -> Result<(), AnimError> {
        let found = match self.layout {
            OutputLayout::Direct => {
                let candidate = self.work_dir.join(video_name);
                fs::metadata(&candidate)
                    .await
                    .is_ok()
                    .then_some(candidate)
            }
            OutputLayout::MediaTree => {
                let stem = source_name.trim_end_matches(".py");
                let predicted = self
                    .media_dir()
                    .join("videos")
                    .join(stem)
                    .join(self.quality.media_dirname())
                    .join(video_name);
                if fs::metadata(&predicted).await.is_ok() {
                    Some(predicted)
                } else {
                    warn!(
                        "renderer output not at predicted path {}; walking media tree",
                        predicted.display()
                    );
                    find_any_mp4(&self.media_dir())
                }
            }
        };

        let Some(found) = found else {
            return Err(AnimError::ArtifactNotFound);
        };

        fs::rename(&found, target).await?;
        Ok(())
    }
}

fn find_any_mp4(media_dir: &Path) -> Option<PathBuf> {
    WalkDir::new(media_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
        })
        .map(|entry| entry.into_path())
}

#[async_trait]
impl SceneRenderer for ManimRenderer {
    async fn render(&self, source: &str, scene_name: &str) -> Result<PathBuf, AnimError> {
        fs::create_dir_all(&self.videos_dir).await?;
        fs::create_dir_all(&self.work_dir).await?;

        let token = Uuid::new_v4();
        let source_name = format!("anim_{token}.py");
        let video_name = format!("video_{token}.mp4");
        let source_path = self.work_dir.join(&source_name);
        let target = self.videos_dir.join(&video_name);

        fs::write(&source_path, source).await?;
        let _cleanup = TempSource(source_path.clone());

        info!(
            "rendering scene {} via {} ({} layout)",
            scene_name,
            self.command,
            match self.layout {
                OutputLayout::Direct => "direct",
                OutputLayout::MediaTree => "media-tree",
            }
        );

        let output = Command::new(&self.command)
            .arg(&source_name)
            .arg(scene_name)
            .arg("-o")
            .arg(&video_name)
            .arg(self.quality.flag())
            .current_dir(&self.work_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!("renderer failed: {}", stderr.trim());
            return Err(AnimError::RendererFailed {
                status: output.status.code().unwrap_or(-1),
                stdout,
                stderr,
            });
        }

        self.collect_artifact(&source_name, &video_name, &target)
            .await?;
        info!("render complete: {}", target.display());
        Ok(target)
    }
}
