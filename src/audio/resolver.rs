use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{config, error::Result};

/// Turns a free-text track query into a playable audio URL.
#[async_trait]
pub trait AudioResolver: Send + Sync {
    /// `Ok(None)` means the search ran but found nothing.
    async fn resolve(&self, query: &str) -> Result<Option<String>>;
}

/// Resolves queries to the first YouTube search hit through `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YoutubeSearchResolver {
    program: PathBuf,
}

impl Default for YoutubeSearchResolver {
    fn default() -> Self {
        Self::new(config::ytdlp_bin())
    }
}

impl YoutubeSearchResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl AudioResolver for YoutubeSearchResolver {
    async fn resolve(&self, query: &str) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .arg("--flat-playlist")
            .arg("--no-warnings")
            .arg("--print")
            .arg("id")
            .arg(format!("ytsearch1:{}", query))
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            warn!(
                query,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "audio search failed"
            );
            return Ok(None);
        }

        let link = first_video_link(&String::from_utf8_lossy(&output.stdout));
        debug!(query, link = ?link, "audio search finished");
        Ok(link)
    }
}

fn first_video_link(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|id| format!("https://www.youtube.com/watch?v={}", id))
}
