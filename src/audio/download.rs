use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{
    config,
    error::{Error, Result},
    utils,
};

/// Player-client profiles tried in order when the primary fetch fails.
pub const CLIENT_PROFILES: [&str; 7] = [
    "web",
    "web_safari",
    "mweb",
    "web_embed",
    "ios",
    "android",
    "tv",
];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Downloads the audio behind a resolved URL into a local file.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    async fn fetch(&self, url: &str, output: &Path) -> Result<()>;
}

/// Where the fetch subprocess gets its cookies from.
#[derive(Debug, Clone, Default)]
pub enum CookieSource {
    #[default]
    None,
    File(PathBuf),
    /// Base64 encoded cookie file, written to a scratch file per fetch.
    Encoded(String),
}

impl CookieSource {
    pub fn from_env() -> Self {
        if let Some(path) = config::ytdlp_cookies_path() {
            return CookieSource::File(path);
        }
        match config::ytdlp_cookies_b64() {
            Some(encoded) => CookieSource::Encoded(encoded),
            None => CookieSource::None,
        }
    }

    fn is_configured(&self) -> bool {
        !matches!(self, CookieSource::None)
    }
}

/// Fetches audio with `youtube-dl`, falling back to `yt-dlp` across
/// [`CLIENT_PROFILES`].
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    primary: PathBuf,
    fallback: PathBuf,
    cookies: CookieSource,
    proxy: Option<String>,
}

impl YtDlpDownloader {
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
            cookies: CookieSource::None,
            proxy: None,
        }
    }

    /// Binaries and cookies from the environment, plus an optional proxy.
    pub fn from_env(proxy: Option<String>) -> Self {
        Self::new(config::youtube_dl_bin(), config::ytdlp_bin())
            .with_cookies(CookieSource::from_env())
            .with_proxy(proxy)
    }

    pub fn with_cookies(mut self, cookies: CookieSource) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Arguments shared by every attempt. The proxy is only used when no
    /// cookies are configured.
    fn common_args(&self, url: &str, output: &Path, cookie_file: Option<&Path>) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            url,
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "0",
            "--format",
            "bestaudio/best",
            "--no-check-certificate",
            "--add-metadata",
            "--prefer-free-formats",
            "--user-agent",
            USER_AGENT,
            "--referer",
            "https://www.youtube.com/",
            "--geo-bypass",
            "--ignore-errors",
            "--no-playlist",
            "--force-ipv4",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.push("-o".into());
        args.push(output.as_os_str().to_owned());

        match (cookie_file, &self.proxy) {
            (Some(cookies), _) => {
                args.push("--cookies".into());
                args.push(cookies.as_os_str().to_owned());
            }
            (None, Some(proxy)) => {
                args.push("--proxy".into());
                args.push(proxy.into());
            }
            (None, None) => {}
        }

        args
    }

    /// Writes encoded cookies to a scratch file that lives until the guard drops.
    fn materialize_cookies(&self) -> Result<(Option<PathBuf>, Option<NamedTempFile>)> {
        match &self.cookies {
            CookieSource::None => Ok((None, None)),
            CookieSource::File(path) => Ok((Some(path.clone()), None)),
            CookieSource::Encoded(encoded) => {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| Error::Config(format!("YTDLP_COOKIES_B64 is not base64: {}", e)))?;
                let file = NamedTempFile::new()?;
                std::fs::write(file.path(), bytes)?;
                Ok((Some(file.path().to_path_buf()), Some(file)))
            }
        }
    }
}

#[async_trait]
impl AudioDownloader for YtDlpDownloader {
    async fn fetch(&self, url: &str, output: &Path) -> Result<()> {
        if !utils::is_youtube_url(url) {
            return Err(Error::Fetch {
                message: format!("not a YouTube URL: {}", url),
            });
        }

        let (cookie_path, _cookie_guard) = self.materialize_cookies()?;
        let args = self.common_args(url, output, cookie_path.as_deref());
        if self.cookies.is_configured() {
            debug!("fetching with cookies");
        }

        let mut last_failure = match run(&self.primary, &args).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        warn!(url, error = %last_failure, "primary fetch failed, trying fallback profiles");

        for profile in CLIENT_PROFILES {
            let mut profile_args = args.clone();
            profile_args.push("--extractor-args".into());
            profile_args.push(format!("youtube:player_client={}", profile).into());

            match run(&self.fallback, &profile_args).await {
                Ok(()) => {
                    info!(url, profile, "fetched audio with fallback profile");
                    return Ok(());
                }
                Err(e) => {
                    debug!(url, profile, error = %e, "fallback profile failed");
                    last_failure = e;
                }
            }
        }

        Err(last_failure)
    }
}

async fn run(program: &Path, args: &[OsString]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::Fetch {
            message: format!("cannot run {}: {}", program.display(), e),
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(Error::Fetch {
        message: format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    })
}
