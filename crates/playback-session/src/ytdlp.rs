//! `yt-dlp` backed media resolver.
//!
//! Resolution shells out to the yt-dlp binary: a metadata-only dump for
//! `resolve` (playlists expand without touching stream URLs) and a
//! stream-URL fetch for `activate`, which then opens the transcoder
//! subprocess against the fetched URL.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

use crate::error::{ActivationError, ResolutionError};
use crate::resolver::MediaResolver;
use crate::source::AudioSource;
use crate::track::TrackInfo;
use crate::transcode::{TranscodeConfig, TranscodeStream};

/// Resolver settings.
#[derive(Clone, Debug)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary.
    pub ytdlp_bin: String,
    /// Transcoder settings used at activation.
    pub transcode: TranscodeConfig,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            transcode: TranscodeConfig::default(),
        }
    }
}

/// Production [`MediaResolver`] delegating to the yt-dlp binary.
pub struct YtDlpResolver {
    config: YtDlpConfig,
}

impl YtDlpResolver {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Run yt-dlp with the given arguments and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, String> {
        let output = Command::new(&self.config.ytdlp_bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| format!("spawn {}: {err}", self.config.ytdlp_bin))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(stderr
                .lines()
                .last()
                .unwrap_or("yt-dlp failed")
                .to_string());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Build a track descriptor from one yt-dlp JSON entry.
///
/// Playlist entries carry only their page URL and overview metadata, with
/// no streaming URL yet.
fn track_from_entry(entry: &serde_json::Value) -> Option<TrackInfo> {
    let page_url = entry
        .get("webpage_url")
        .or_else(|| entry.get("url"))
        .and_then(|v| v.as_str())?
        .to_string();
    let title = entry
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown title")
        .to_string();
    let duration_secs = entry
        .get("duration")
        .and_then(|v| v.as_f64())
        .map(|secs| secs as u64);
    let thumbnail = entry
        .get("thumbnail")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Some(TrackInfo {
        id: Uuid::new_v4(),
        title,
        page_url,
        duration_secs,
        thumbnail,
        requested_by: String::new(),
    })
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, reference: &str) -> Result<Vec<TrackInfo>, ResolutionError> {
        // --flat-playlist keeps playlist expansion metadata-only.
        let raw = self
            .run(&[
                "--dump-single-json",
                "--flat-playlist",
                "--no-warnings",
                "--default-search",
                "auto",
                "--",
                reference,
            ])
            .await
            .map_err(ResolutionError::new)?;
        let data: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|err| ResolutionError::new(format!("parse yt-dlp output: {err}")))?;
        let tracks: Vec<TrackInfo> = match data.get("entries").and_then(|v| v.as_array()) {
            Some(entries) => entries.iter().filter_map(track_from_entry).collect(),
            None => track_from_entry(&data).into_iter().collect(),
        };
        if tracks.is_empty() {
            return Err(ResolutionError::new("no playable entries"));
        }
        Ok(tracks)
    }

    async fn activate(&self, track: &TrackInfo) -> Result<AudioSource, ActivationError> {
        let raw = self
            .run(&[
                "--get-url",
                "-f",
                "bestaudio/best",
                "--no-playlist",
                "--no-warnings",
                "--",
                &track.page_url,
            ])
            .await
            .map_err(ActivationError::new)?;
        let stream_url = raw
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| ActivationError::new("yt-dlp returned no stream url"))?;
        let stream = TranscodeStream::spawn(&self.config.transcode, stream_url.trim())?;
        Ok(AudioSource::new(Box::new(stream), 1.0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entry_parsing_prefers_webpage_url() {
        let entry = json!({
            "title": "Song",
            "webpage_url": "https://example.com/watch?v=1",
            "url": "https://example.com/short",
            "duration": 213.4,
            "thumbnail": "https://example.com/thumb.jpg",
        });
        let track = track_from_entry(&entry).unwrap();
        assert_eq!(track.title, "Song");
        assert_eq!(track.page_url, "https://example.com/watch?v=1");
        assert_eq!(track.duration_secs, Some(213));
        assert_eq!(track.thumbnail.as_deref(), Some("https://example.com/thumb.jpg"));
    }

    #[test]
    fn entry_parsing_falls_back_to_url_for_playlist_entries() {
        let entry = json!({
            "title": "Entry",
            "url": "https://example.com/watch?v=2",
        });
        let track = track_from_entry(&entry).unwrap();
        assert_eq!(track.page_url, "https://example.com/watch?v=2");
        assert_eq!(track.duration_secs, None);
    }

    #[test]
    fn entry_without_any_url_is_dropped() {
        let entry = json!({ "title": "broken" });
        assert!(track_from_entry(&entry).is_none());
    }
}
