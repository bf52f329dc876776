//! Track metadata and the two-phase track lifecycle.
//!
//! A track enters the queue as lightweight metadata and is promoted to the
//! active variant (metadata plus a live audio source) as close to its
//! playback start as possible.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::source::AudioSource;

/// Metadata describing a resolved track.
///
/// Sufficient to re-resolve the playable stream later; carries no stream
/// handle itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Stable id assigned at resolve time.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Canonical page URL (not a streaming URL).
    pub page_url: String,
    /// Duration in seconds, when the resolver reports one.
    pub duration_secs: Option<u64>,
    /// Thumbnail URL if available.
    pub thumbnail: Option<String>,
    /// Who asked for this track.
    pub requested_by: String,
}

impl TrackInfo {
    /// Total duration as `H:MM:SS`, or `?:??:??` when unknown.
    pub fn duration_text(&self) -> String {
        match self.duration_secs {
            Some(secs) => format_duration(secs),
            None => "?:??:??".to_string(),
        }
    }
}

/// A queued or active track.
///
/// The pending queue and the history hold these; only the active variant
/// owns a live, single-use audio source.
pub enum Track {
    /// Metadata only. Cheap to create, may expire before being played.
    Queued(TrackInfo),
    /// Metadata plus a live audio source handle.
    Active(TrackInfo, AudioSource),
}

impl Track {
    /// Metadata for either variant.
    pub fn info(&self) -> &TrackInfo {
        match self {
            Track::Queued(info) => info,
            Track::Active(info, _) => info,
        }
    }

    /// True when a live source handle is attached.
    pub fn is_active(&self) -> bool {
        matches!(self, Track::Active(..))
    }

    /// Keep the metadata, releasing any live source.
    pub fn into_info(self) -> TrackInfo {
        match self {
            Track::Queued(info) => info,
            Track::Active(info, source) => {
                drop(source);
                info
            }
        }
    }
}

/// Format a second count as `H:MM:SS`.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_pads_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(59), "0:00:59");
        assert_eq!(format_duration(61), "0:01:01");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3 * 3600 + 25 * 60 + 7), "3:25:07");
    }

    #[test]
    fn duration_text_handles_unknown_duration() {
        let info = TrackInfo {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            page_url: "u".to_string(),
            duration_secs: None,
            thumbnail: None,
            requested_by: String::new(),
        };
        assert_eq!(info.duration_text(), "?:??:??");
    }
}
