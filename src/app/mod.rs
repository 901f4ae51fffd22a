mod wiring;

use std::path::Path;

use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;

use crate::{cli, context, rest};

pub struct App {
    pub ctx: context::Context,
    pub state: rest::AppState,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli)?;

        crate::tracing::init(ctx.config.log_file.as_deref().map(Path::new));
        log::info!("🚀 Starting cryptobank");
        log::info!("🌐 Listen address: {}", ctx.config.listen);
        match ctx.config.db.as_deref() {
            Some(path) => log::info!("📂 Database: {}", path),
            None => log::info!("📂 Database: in-memory"),
        }

        let storage = wiring::init_storage(&ctx).context("initializing storage")?;
        let state = wiring::build_state(&ctx, storage);

        Ok((Self { ctx, state }, cli))
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    log::info!(
        "🏦 Branch {} ({} accounts)",
        app.ctx.config.branch,
        app.ctx.config.account_type
    );
    log::info!("⏳ Session TTL: {}s", app.ctx.config.session_ttl.as_secs());
    if let Some(path) = app.ctx.config.log_file.as_deref() {
        log::info!("📝 Log file: {}", path);
    }

    let shutdown = CancellationToken::new();

    // REST
    let api_addr = app.ctx.config.listen;
    let rest_state = app.state.clone();
    let rest_shutdown = shutdown.clone();

    let mut rest_handle = tokio::spawn(async move {
        if let Err(e) = rest::serve(api_addr, rest_state, rest_shutdown).await {
            log::error!("REST server error: {}", e);
        }
    });

    // Session sweeper
    let sessions = app.state.sessions.clone();
    let sweep_shutdown = shutdown.clone();

    let mut sweep_handle = tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = sweep_shutdown.cancelled() => break,
                _ = tick.tick() => {
                    let removed = sessions.prune();
                    if removed > 0 {
                        log::debug!("🧹 Pruned {} expired sessions", removed);
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
        }
        _ = &mut rest_handle => {},
        _ = &mut sweep_handle => {},
    }

    shutdown.cancel();
    let rest_result = rest_handle.await;
    let sweep_result = sweep_handle.await;

    let mut fatal_error: Option<anyhow::Error> = None;

    if let Err(e) = rest_result {
        log::error!("REST server error: {}", e);
        fatal_error = Some(e.into());
    }
    if let Err(e) = sweep_result {
        log::error!("Session sweeper error: {}", e);
        fatal_error.get_or_insert(e.into());
    }

    if let Some(e) = fatal_error {
        return Err(e);
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        cmd.run(&app.ctx, app.state.storage.clone())?;
        return Ok(());
    }

    run_daemon(app).await
}
