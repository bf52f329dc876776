use utoipa::OpenApi;

use crate::api;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::sessions::sessions_list,
        api::sessions::session_leave,
        api::queue::queue_add,
        api::queue::queue_list,
        api::queue::queue_shuffle,
        api::playback::pause,
        api::playback::resume,
        api::playback::skip,
        api::playback::set_volume,
        api::playback::set_loop_mode,
        api::playback::now_playing,
    ),
    components(
        schemas(
            api::health::HealthResponse,
            models::TrackModel,
            models::EnqueueRequest,
            models::EnqueuedModel,
            models::EnqueueResponse,
            models::QueuePageResponse,
            models::NowPlayingResponse,
            models::SessionSummary,
            models::SessionsListResponse,
            models::VolumeRequest,
            models::LoopRequest,
            playback_session::LoopMode,
        )
    ),
    tags(
        (name = "playback-hub-server", description = "Per-session playback scheduler API")
    )
)]
pub struct ApiDoc;
