//! API models and OpenAPI schemas.
//!
//! Defines request/response structures for the hub server API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use playback_session::{Enqueued, LoopMode, TrackInfo};

/// A track descriptor returned by queue and status endpoints.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackModel {
    /// Stable track id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Canonical page URL.
    pub page_url: String,
    /// Duration in seconds when known.
    pub duration_secs: Option<u64>,
    /// Duration as `H:MM:SS`.
    pub duration_text: String,
    /// Thumbnail URL if available.
    pub thumbnail: Option<String>,
    /// Who requested the track.
    pub requested_by: String,
}

impl From<&TrackInfo> for TrackModel {
    fn from(info: &TrackInfo) -> Self {
        Self {
            id: info.id.to_string(),
            title: info.title.clone(),
            page_url: info.page_url.clone(),
            duration_secs: info.duration_secs,
            duration_text: info.duration_text(),
            thumbnail: info.thumbnail.clone(),
            requested_by: info.requested_by.clone(),
        }
    }
}

/// Enqueue request payload.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EnqueueRequest {
    /// Media reference: a page URL, playlist URL, or search term.
    pub reference: String,
    /// Requester identity recorded on the resolved tracks.
    #[serde(default)]
    pub requested_by: Option<String>,
}

/// One track added by an enqueue.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EnqueuedModel {
    pub track: TrackModel,
    /// True when the track had its stream opened eagerly.
    pub active: bool,
}

impl From<&Enqueued> for EnqueuedModel {
    fn from(enqueued: &Enqueued) -> Self {
        Self {
            track: TrackModel::from(&enqueued.track),
            active: enqueued.active,
        }
    }
}

/// Enqueue response payload.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EnqueueResponse {
    /// Number of tracks appended.
    pub added: usize,
    pub tracks: Vec<EnqueuedModel>,
}

/// One page of the pending queue.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QueuePageResponse {
    pub page: usize,
    /// Total pending tracks across all pages.
    pub total: usize,
    pub items: Vec<TrackModel>,
}

/// Now-playing response payload.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NowPlayingResponse {
    pub track: TrackModel,
    /// Elapsed play time in seconds.
    pub elapsed_secs: u64,
    /// `elapsed / total` rendering.
    pub progress_text: String,
    pub paused: bool,
    pub loop_mode: LoopMode,
    pub volume: f32,
}

/// Session summary entry.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    /// Session key.
    pub key: String,
    /// Number of pending tracks.
    pub queue_len: usize,
    /// Currently playing track, if any.
    pub now_playing: Option<TrackModel>,
    pub loop_mode: LoopMode,
    pub volume: f32,
}

/// Sessions listing response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionsListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Volume request payload.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VolumeRequest {
    /// Volume in `[0, 1]`.
    pub volume: f32,
}

/// Loop mode request payload.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoopRequest {
    pub mode: LoopMode,
}
