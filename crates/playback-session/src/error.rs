//! Error types surfaced by the scheduler core.

use std::fmt;

/// A media reference could not be turned into track metadata.
///
/// Covers not-found, network failures, and unsupported references alike;
/// the queue is left untouched when this is returned.
#[derive(Clone, Debug)]
pub struct ResolutionError {
    /// Human-readable failure reason.
    pub reason: String,
}

impl ResolutionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to resolve reference: {}", self.reason)
    }
}

impl std::error::Error for ResolutionError {}

/// Track metadata could not be turned into a playable stream.
///
/// The offending queue position is skipped with a notice; playback moves on.
#[derive(Clone, Debug)]
pub struct ActivationError {
    /// Human-readable failure reason.
    pub reason: String,
}

impl ActivationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to activate track: {}", self.reason)
    }
}

impl std::error::Error for ActivationError {}

/// The output sink rejected a playback operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkError {
    /// The sink has no live connection to the output transport.
    NotConnected,
    /// The sink worker is gone; commands can no longer be delivered.
    Closed,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::NotConnected => write!(f, "output sink is not connected"),
            SinkError::Closed => write!(f, "output sink is gone"),
        }
    }
}

impl std::error::Error for SinkError {}

/// A control operation was invoked in a state that cannot accept it.
///
/// Rejected synchronously with no state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreconditionError {
    /// Pause/resume/skip with no current track.
    NothingPlaying,
    /// Pause while already paused.
    AlreadyPaused,
    /// Resume while not paused.
    NotPaused,
    /// Shuffle on an empty pending queue.
    EmptyQueue,
    /// Volume outside the `[0, 1]` range.
    VolumeOutOfRange,
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionError::NothingPlaying => write!(f, "nothing is playing"),
            PreconditionError::AlreadyPaused => write!(f, "playback is already paused"),
            PreconditionError::NotPaused => write!(f, "playback is not paused"),
            PreconditionError::EmptyQueue => write!(f, "the queue is empty"),
            PreconditionError::VolumeOutOfRange => {
                write!(f, "volume must be between 0 and 1, inclusive")
            }
        }
    }
}

impl std::error::Error for PreconditionError {}

/// Failure of a synchronous control operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlError {
    /// The operation's precondition does not hold.
    Precondition(PreconditionError),
    /// The output sink rejected the operation.
    Sink(SinkError),
}

impl From<PreconditionError> for ControlError {
    fn from(err: PreconditionError) -> Self {
        ControlError::Precondition(err)
    }
}

impl From<SinkError> for ControlError {
    fn from(err: SinkError) -> Self {
        ControlError::Sink(err)
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Precondition(err) => err.fmt(f),
            ControlError::Sink(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ControlError {}
