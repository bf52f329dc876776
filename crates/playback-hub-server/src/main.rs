mod api;
mod config;
mod local_sink;
mod models;
mod openapi;
mod session_manager;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use playback_session::transcode::TranscodeConfig;
use playback_session::ytdlp::{YtDlpConfig, YtDlpResolver};

use crate::local_sink::LocalSinkConnector;
use crate::session_manager::SessionManager;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "playback-hub-server")]
struct Args {
    /// HTTP bind address, e.g. 0.0.0.0:8080
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// Optional server config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,actix_web=info,playback_hub_server=info")
        }))
        .init();

    let cfg = match args.config.as_ref() {
        Some(path) => config::ServerConfig::load(path)?,
        None => config::ServerConfig::default(),
    };
    let bind = match args.bind {
        Some(addr) => addr,
        None => config::bind_from_config(&cfg)?
            .unwrap_or_else(|| "0.0.0.0:8080".parse().expect("default bind")),
    };

    let ytdlp_bin = cfg.resolved_ytdlp_bin();
    let ffmpeg_bin = cfg.resolved_ffmpeg_bin();
    tracing::info!(
        bind = %bind,
        ytdlp = %ytdlp_bin,
        ffmpeg = %ffmpeg_bin,
        "starting playback-hub-server"
    );

    let resolver = Arc::new(YtDlpResolver::new(YtDlpConfig {
        ytdlp_bin,
        transcode: TranscodeConfig { ffmpeg_bin },
    }));
    let sessions = SessionManager::new(
        resolver,
        Arc::new(LocalSinkConnector),
        cfg.resolved_default_volume(),
    );
    let state = web::Data::new(AppState::new(sessions, cfg.resolved_page_size()));
    let state_for_shutdown = state.clone();

    let _ = ctrlc::set_handler(move || {
        if let Some(system) = actix_web::rt::System::try_current() {
            system.stop();
        } else {
            std::process::exit(0);
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default().exclude("/health"))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .service(api::health::health)
            .service(api::sessions_list)
            .service(api::session_leave)
            .service(api::queue_add)
            .service(api::queue_list)
            .service(api::queue_shuffle)
            .service(api::pause)
            .service(api::resume)
            .service(api::skip)
            .service(api::set_volume)
            .service(api::set_loop_mode)
            .service(api::now_playing)
    })
    .bind(bind)?
    .run()
    .await?;

    // Release loop tasks and transcoder subprocesses before exiting.
    state_for_shutdown.sessions.teardown_all().await;
    Ok(())
}
