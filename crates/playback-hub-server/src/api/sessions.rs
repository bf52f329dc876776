//! Session management API handlers.

use actix_web::{HttpResponse, Responder, delete, get, web};

use crate::models::{SessionSummary, SessionsListResponse, TrackModel};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Active sessions", body = SessionsListResponse)
    )
)]
#[get("/sessions")]
/// List active sessions.
pub async fn sessions_list(state: web::Data<AppState>) -> impl Responder {
    let sessions = state
        .sessions
        .list()
        .into_iter()
        .map(|(key, session)| SessionSummary {
            key,
            queue_len: session.queue_len(),
            now_playing: session.now_playing().map(|np| TrackModel::from(&np.track)),
            loop_mode: session.loop_mode(),
            volume: session.volume(),
        })
        .collect();
    HttpResponse::Ok().json(SessionsListResponse { sessions })
}

#[utoipa::path(
    delete,
    path = "/sessions/{key}",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    responses(
        (status = 200, description = "Session torn down"),
        (status = 404, description = "Session not found")
    )
)]
#[delete("/sessions/{key}")]
/// Stop playback and destroy the session.
pub async fn session_leave(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    if state.sessions.teardown(&key).await {
        HttpResponse::Ok().finish()
    } else {
        super::session_not_found()
    }
}
