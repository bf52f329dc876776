//! Playback-related API handlers.

use actix_web::{HttpResponse, Responder, get, post, web};

use crate::models::{LoopRequest, NowPlayingResponse, TrackModel, VolumeRequest};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/sessions/{key}/pause",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    responses(
        (status = 200, description = "Playback paused"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Nothing playing or already paused")
    )
)]
#[post("/sessions/{key}/pause")]
/// Pause the currently playing track.
pub async fn pause(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    match session.pause() {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => super::control_error_response(err),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/resume",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    responses(
        (status = 200, description = "Playback resumed"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Nothing playing or not paused")
    )
)]
#[post("/sessions/{key}/resume")]
/// Resume the currently paused track.
pub async fn resume(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    match session.resume() {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => super::control_error_response(err),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/skip",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    responses(
        (status = 200, description = "Track skipped"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Nothing playing")
    )
)]
#[post("/sessions/{key}/skip")]
/// Force-stop the current track and advance.
pub async fn skip(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    match session.skip() {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => super::control_error_response(err),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/volume",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    request_body = VolumeRequest,
    responses(
        (status = 200, description = "Volume stored; applies to the next track"),
        (status = 400, description = "Volume out of range"),
        (status = 404, description = "Session not found")
    )
)]
#[post("/sessions/{key}/volume")]
/// Store the volume applied to the next activated track.
pub async fn set_volume(
    state: web::Data<AppState>,
    key: web::Path<String>,
    body: web::Json<VolumeRequest>,
) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    match session.set_volume(body.volume) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => super::precondition_response(err),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/loop",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    request_body = LoopRequest,
    responses(
        (status = 200, description = "Loop mode set"),
        (status = 404, description = "Session not found")
    )
)]
#[post("/sessions/{key}/loop")]
/// Set the loop mode; takes effect at the next selection.
pub async fn set_loop_mode(
    state: web::Data<AppState>,
    key: web::Path<String>,
    body: web::Json<LoopRequest>,
) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    session.set_loop_mode(body.mode);
    HttpResponse::Ok().finish()
}

#[utoipa::path(
    get,
    path = "/sessions/{key}/now",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    responses(
        (status = 200, description = "Current track and progress", body = NowPlayingResponse),
        (status = 204, description = "Nothing playing"),
        (status = 404, description = "Session not found")
    )
)]
#[get("/sessions/{key}/now")]
/// Return the current track and its elapsed progress.
pub async fn now_playing(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    let Some(np) = session.now_playing() else {
        return HttpResponse::NoContent().finish();
    };
    HttpResponse::Ok().json(NowPlayingResponse {
        track: TrackModel::from(&np.track),
        elapsed_secs: np.elapsed.as_secs(),
        progress_text: np.progress_text(),
        paused: np.paused,
        loop_mode: session.loop_mode(),
        volume: session.volume(),
    })
}
