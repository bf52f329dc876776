//! Per-session media playback scheduling.
//!
//! Resolves enqueued media references into playable audio sources just in
//! time, feeds one active source at a time to an output sink, and exposes
//! control operations (pause/resume/skip/shuffle/loop/volume) over the
//! in-flight playback state. One [`SessionQueue`] per independent session;
//! sessions never interact.

pub mod error;
pub mod events;
pub mod list;
pub mod resolver;
pub mod session;
pub mod sink;
pub mod source;
pub mod track;
pub mod transcode;
pub mod ytdlp;

pub use error::{ActivationError, ControlError, PreconditionError, ResolutionError, SinkError};
pub use events::{SessionEvent, SessionEvents};
pub use list::TrackList;
pub use resolver::MediaResolver;
pub use session::{Enqueued, LoopMode, NowPlaying, QueuePage, SessionQueue};
pub use sink::{OutputSink, PlaybackEnded};
pub use source::{AudioSource, MediaStream};
pub use track::{Track, TrackInfo};
