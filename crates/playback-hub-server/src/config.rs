//! Configuration loading and parsing.
//!
//! Defines the server config schema and resolves defaults.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level server configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Bind address (host:port).
    pub bind: Option<String>,
    /// Path to the yt-dlp binary used for resolution.
    pub ytdlp_bin: Option<String>,
    /// Path to the ffmpeg binary used for transcoding.
    pub ffmpeg_bin: Option<String>,
    /// Volume applied to new sessions, in `[0, 1]`.
    pub default_volume: Option<f32>,
    /// Page size for queue listings.
    pub queue_page_size: Option<usize>,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ServerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    pub fn resolved_ytdlp_bin(&self) -> String {
        self.ytdlp_bin.clone().unwrap_or_else(|| "yt-dlp".to_string())
    }

    pub fn resolved_ffmpeg_bin(&self) -> String {
        self.ffmpeg_bin.clone().unwrap_or_else(|| "ffmpeg".to_string())
    }

    pub fn resolved_default_volume(&self) -> f32 {
        self.default_volume.unwrap_or(0.5).clamp(0.0, 1.0)
    }

    pub fn resolved_page_size(&self) -> usize {
        self.queue_page_size.unwrap_or(10).max(1)
    }
}

/// Parse an optional bind address from config.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<Option<SocketAddr>> {
    let Some(bind) = cfg.bind.as_deref() else {
        return Ok(None);
    };
    let addr = bind.parse().with_context(|| format!("parse bind {bind}"))?;
    Ok(Some(addr))
}
