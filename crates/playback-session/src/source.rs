//! Live audio source handles.
//!
//! An [`AudioSource`] owns the consumable byte stream produced by track
//! activation plus the effective volume multiplier applied at playback
//! start. Release is idempotent and guaranteed on drop, so an abandoned
//! handle can never leak its producer.

use tokio::io::AsyncRead;

/// Consumable byte stream behind an active track.
///
/// Implementations wrap a transcoder subprocess (or a test double) and
/// must terminate the underlying producer on `release`.
pub trait MediaStream: AsyncRead + Send + Unpin {
    /// Stop the producer and free its resources. Called at most once.
    fn release(&mut self);
}

/// Single-use audio source attached to an active track.
pub struct AudioSource {
    stream: Option<Box<dyn MediaStream>>,
    volume: f32,
}

impl AudioSource {
    /// Wrap a stream with a starting volume multiplier.
    pub fn new(stream: Box<dyn MediaStream>, volume: f32) -> Self {
        Self {
            stream: Some(stream),
            volume,
        }
    }

    /// Effective volume multiplier in `[0, 1]`.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the effective volume multiplier.
    ///
    /// Takes effect when the sink starts consuming the stream; it does not
    /// reach a stream that is already being drained.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Borrow the underlying stream for reading, if not yet released.
    pub fn stream_mut(&mut self) -> Option<&mut Box<dyn MediaStream>> {
        self.stream.as_mut()
    }

    /// Release the underlying stream. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }

    /// True once the stream has been released.
    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.release();
    }
}
