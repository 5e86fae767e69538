use crate::config::Config;
use anyhow::Result;
use tokio::fs;
use tracing::info;

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.videos_dir, &cfg.work_dir] {
        if fs::metadata(dir).await.is_err() {
            fs::create_dir_all(dir).await?;
            info!("created directory: {}", dir.display());
        }
    }
    Ok(())
}

pub async fn check_renderer(command: &str) -> bool {
    match tokio::process::Command::new(command)
        .arg("--version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ensure_directories_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut cfg = test_config();
        cfg.videos_dir = dir.path().join("videos");
        cfg.work_dir = dir.path().join("work");

        ensure_directories(&cfg).await.unwrap();
        ensure_directories(&cfg).await.unwrap();
        assert!(cfg.videos_dir.is_dir());
        assert!(cfg.work_dir.is_dir());
    }

    #[tokio::test]
    async fn missing_renderer_is_reported() {
        assert!(!check_renderer("definitely-not-a-real-renderer").await);
    }
}
