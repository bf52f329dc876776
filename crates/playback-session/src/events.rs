//! Per-session event stream.
//!
//! Lightweight broadcast channel used as the session's notification
//! channel: the playback loop reports lifecycle changes and per-track
//! failures here instead of terminating.

use tokio::sync::broadcast;

use crate::track::TrackInfo;

/// Events published by a session's playback loop.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A track was handed to the output sink.
    TrackStarted { track: TrackInfo },
    /// The sink reported completion (natural end or stop).
    TrackFinished { track: TrackInfo },
    /// A track could not be activated and was skipped.
    TrackFailed { track: TrackInfo, reason: String },
    /// The sink rejected playback of an activated track.
    SinkFailed { track: TrackInfo, reason: String },
}

/// Broadcast sender for session events.
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create an event stream with a bounded broadcast channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn track_started(&self, track: TrackInfo) {
        let _ = self.sender.send(SessionEvent::TrackStarted { track });
    }

    pub(crate) fn track_finished(&self, track: TrackInfo) {
        let _ = self.sender.send(SessionEvent::TrackFinished { track });
    }

    pub(crate) fn track_failed(&self, track: TrackInfo, reason: String) {
        let _ = self.sender.send(SessionEvent::TrackFailed { track, reason });
    }

    pub(crate) fn sink_failed(&self, track: TrackInfo, reason: String) {
        let _ = self.sender.send(SessionEvent::SinkFailed { track, reason });
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
