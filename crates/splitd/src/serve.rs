//! Daemon startup: build the timer from bootstrap config and serve it.

use crate::dialogs::PendingDialogs;
use crate::notice::NoticeBus;
use crate::service::TimerService;
use crate::web::{self, AppState};
use anyhow::{Context, Result};
use splitconf::{BootstrapConfig, ResetPolicy, SplitConfig};
use splitcore::{
    CommandSink, Dialog, Engine, FixedChoice, LocalEngine, ResetDecision, Run, Timer,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const NOTICE_CAPACITY: usize = 256;
const REQUEST_BUFFER: usize = 64;

/// The run described by `[bootstrap.run]`.
pub fn bootstrap_run(engine: Arc<dyn Engine>, config: &BootstrapConfig) -> Run {
    let mut run = Run::with_segments(engine, &config.run.segments);
    run.set_game_name(&config.run.game);
    run.set_category_name(&config.run.category);
    run
}

/// Wire a fresh engine, timer, sink and service together. Must be called
/// inside a tokio runtime.
pub fn build_state(config: &BootstrapConfig) -> Result<AppState> {
    let engine: Arc<dyn Engine> = Arc::new(LocalEngine::new());
    let timer = Timer::new(bootstrap_run(engine, config))
        .context("Failed to create timer from [bootstrap.run]")?;

    let notices = NoticeBus::new(NOTICE_CAPACITY);
    let dialogs = Arc::new(PendingDialogs::new(notices.clone()));
    let dialog: Arc<dyn Dialog> = match config.reset.on_new_best_times {
        ResetPolicy::Ask => dialogs.clone(),
        ResetPolicy::Save => Arc::new(FixedChoice(ResetDecision::SaveBestTimes.choice())),
        ResetPolicy::Discard => Arc::new(FixedChoice(ResetDecision::DiscardBestTimes.choice())),
    };

    let sink = CommandSink::new(timer.into_shared(), Arc::new(notices.clone()), dialog);
    let timer = TimerService::spawn(sink, REQUEST_BUFFER);

    Ok(AppState {
        timer,
        notices,
        dialogs,
        start_time: Instant::now(),
    })
}

/// Run the daemon until SIGINT or SIGTERM.
pub async fn run(config: SplitConfig) -> Result<()> {
    info!("splitd starting");
    let addr = config
        .infra
        .bind
        .socket_addr()
        .context("Invalid bind address")?;

    let state = build_state(&config.bootstrap)?;
    info!(
        game = %config.bootstrap.run.game,
        category = %config.bootstrap.run.category,
        segments = config.bootstrap.run.segments.len(),
        reset_policy = %config.bootstrap.reset.on_new_best_times,
        "timer ready"
    );

    let app = web::router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("splitd ready");
    info!("   Remote control: ws://{}/remote", addr);
    info!("   Events: ws://{}/events", addr);
    info!("   Health: GET http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
