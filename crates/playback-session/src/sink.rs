//! Output sink seam.
//!
//! The sink is the external component that actually carries audio to
//! listeners. `play` hands over the single-use audio source together with
//! a completion signal that fires exactly once per play call, on natural
//! end-of-stream or on `stop`.

use tokio::sync::oneshot;

use crate::error::SinkError;
use crate::source::AudioSource;

/// How a playback attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEnded {
    /// The stream was consumed to its end.
    Finished,
    /// Playback was force-stopped (skip or teardown).
    Stopped,
}

pub trait OutputSink: Send + Sync {
    /// Hand an audio source to the sink.
    ///
    /// The sink takes ownership of the source and releases it when
    /// playback ends. `on_complete` fires exactly once.
    fn play(
        &self,
        source: AudioSource,
        on_complete: oneshot::Sender<PlaybackEnded>,
    ) -> Result<(), SinkError>;

    /// Pause the in-flight stream.
    fn pause(&self) -> Result<(), SinkError>;

    /// Resume a paused stream.
    fn resume(&self) -> Result<(), SinkError>;

    /// Force-stop the in-flight stream, firing its completion signal.
    fn stop(&self) -> Result<(), SinkError>;

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Drop the sink's connection to the output transport.
    fn disconnect(&self);
}
