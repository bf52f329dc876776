//! Media resolution seam.
//!
//! Two-call lifecycle: `resolve` turns a reference into lightweight track
//! metadata (a playlist reference expands into many), `activate` turns one
//! track's metadata into a live audio source. Implementations may sit on
//! slow network I/O; the playback loop is the only caller that waits on
//! `activate`, and it has nothing else to do while it waits.

use async_trait::async_trait;

use crate::error::{ActivationError, ResolutionError};
use crate::source::AudioSource;
use crate::track::TrackInfo;

#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve a reference into one or more queued-track descriptors.
    ///
    /// A playlist reference expands into one descriptor per entry, each
    /// carrying metadata only; stream URLs are fetched per track at
    /// activation time, since fetching them eagerly for a whole playlist
    /// is wasteful and they can expire before use.
    async fn resolve(&self, reference: &str) -> Result<Vec<TrackInfo>, ResolutionError>;

    /// Fetch the playable stream for a track and open its audio source.
    async fn activate(&self, track: &TrackInfo) -> Result<AudioSource, ActivationError>;
}
