//! Queue-related API handlers.

use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{EnqueueRequest, EnqueueResponse, EnqueuedModel, QueuePageResponse, TrackModel};
use crate::state::AppState;

/// Queue listing query parameters.
#[derive(Debug, Deserialize, IntoParams)]
pub struct QueuePageQuery {
    /// Zero-based page index.
    pub page: Option<usize>,
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/queue",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    request_body = EnqueueRequest,
    responses(
        (status = 200, description = "Tracks appended", body = EnqueueResponse),
        (status = 422, description = "Reference could not be resolved"),
        (status = 503, description = "Output sink unavailable")
    )
)]
#[post("/sessions/{key}/queue")]
/// Resolve a reference and append the resulting tracks to the queue.
///
/// Creates the session on demand.
pub async fn queue_add(
    state: web::Data<AppState>,
    key: web::Path<String>,
    body: web::Json<EnqueueRequest>,
) -> impl Responder {
    let session = match state.sessions.get_or_create(&key) {
        Ok(session) => session,
        Err(err) => return super::sink_error_response(err),
    };
    let requested_by = body
        .requested_by
        .clone()
        .unwrap_or_else(|| "anonymous".to_string());
    tracing::info!(session = %key, reference = %body.reference, "enqueue request");
    match session.enqueue(&body.reference, &requested_by).await {
        Ok(added) => HttpResponse::Ok().json(EnqueueResponse {
            added: added.len(),
            tracks: added.iter().map(EnqueuedModel::from).collect(),
        }),
        Err(err) => HttpResponse::UnprocessableEntity().body(err.to_string()),
    }
}

#[utoipa::path(
    get,
    path = "/sessions/{key}/queue",
    params(
        ("key" = String, Path, description = "Session key"),
        QueuePageQuery
    ),
    responses(
        (status = 200, description = "One page of the pending queue", body = QueuePageResponse),
        (status = 404, description = "Session not found")
    )
)]
#[get("/sessions/{key}/queue")]
/// Return one page of the pending queue.
pub async fn queue_list(
    state: web::Data<AppState>,
    key: web::Path<String>,
    query: web::Query<QueuePageQuery>,
) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    let page = session.queue_page(query.page.unwrap_or(0), state.page_size);
    HttpResponse::Ok().json(QueuePageResponse {
        page: page.page,
        total: page.total,
        items: page.items.iter().map(TrackModel::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/sessions/{key}/queue/shuffle",
    params(
        ("key" = String, Path, description = "Session key")
    ),
    responses(
        (status = 200, description = "Queue shuffled"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Queue is empty")
    )
)]
#[post("/sessions/{key}/queue/shuffle")]
/// Shuffle the pending queue.
pub async fn queue_shuffle(state: web::Data<AppState>, key: web::Path<String>) -> impl Responder {
    let Some(session) = state.sessions.get(&key) else {
        return super::session_not_found();
    };
    match session.shuffle() {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => super::precondition_response(err),
    }
}
