//! HTTP API handlers.
//!
//! Defines the Actix routes for session, queue, and playback control.

pub mod health;
pub mod playback;
pub mod queue;
pub mod sessions;

pub use playback::{now_playing, pause, resume, set_loop_mode, set_volume, skip};
pub use queue::{queue_add, queue_list, queue_shuffle};
pub use sessions::{session_leave, sessions_list};

use actix_web::HttpResponse;

use playback_session::{ControlError, PreconditionError, SinkError};

/// Map a control-operation failure onto an HTTP response.
pub(crate) fn control_error_response(err: ControlError) -> HttpResponse {
    match err {
        ControlError::Precondition(err) => precondition_response(err),
        ControlError::Sink(err) => sink_error_response(err),
    }
}

pub(crate) fn precondition_response(err: PreconditionError) -> HttpResponse {
    match err {
        PreconditionError::NothingPlaying => HttpResponse::Conflict().body("nothing is playing"),
        PreconditionError::AlreadyPaused => HttpResponse::Conflict().body("already paused"),
        PreconditionError::NotPaused => HttpResponse::Conflict().body("not paused"),
        PreconditionError::EmptyQueue => HttpResponse::Conflict().body("queue is empty"),
        PreconditionError::VolumeOutOfRange => {
            HttpResponse::BadRequest().body("volume must be between 0 and 1, inclusive")
        }
    }
}

pub(crate) fn sink_error_response(err: SinkError) -> HttpResponse {
    match err {
        SinkError::NotConnected => {
            HttpResponse::ServiceUnavailable().body("output sink is not connected")
        }
        SinkError::Closed => HttpResponse::ServiceUnavailable().body("output sink is gone"),
    }
}

pub(crate) fn session_not_found() -> HttpResponse {
    HttpResponse::NotFound().body("session not found")
}
