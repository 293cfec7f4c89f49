use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use teatrade_api::{AppState, build_app, build_verifier};
use teatrade_infra::Settings;
use teatrade_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    teatrade_observability::init(&settings.log.filter, LogFormat::parse(&settings.log.format));

    let db = teatrade_infra::connect(&settings.database)
        .await
        .context("failed to open the record store")?;
    let jwt = build_verifier(&settings.auth).context("invalid auth settings")?;

    let addr = settings.server.bind_addr();
    let grace = Duration::from_secs(settings.server.shutdown_grace_secs);
    let sweep_every = settings.rate_limit.window();

    let state = AppState::new(db.clone(), jwt, settings);
    let sweeper = state.limiter.spawn_sweeper(sweep_every);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    server.await.context("server error")?;

    tracing::info!(grace_secs = grace.as_secs(), "shutting down");
    if tokio::time::timeout(grace, async {
        sweeper.stop().await;
        db.close().await;
    })
    .await
    .is_err()
    {
        tracing::warn!("shutdown grace period elapsed before cleanup finished");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
