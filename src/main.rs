use batepapo::{app, clock, config::Config, db::Store, reaper::Reaper, AppState};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // before the runtime spawns its workers
    let offset = clock::init_local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(offset))
}

async fn run(offset: time::UtcOffset) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("batepapo=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(?offset, "message times use this utc offset");

    let store = Store::connect(&config.database_url).await?;
    tracing::info!("store connected");

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let reaper = Reaper::new(store.clone(), config.inactivity, config.sweep_interval)
        .spawn(shutdown_rx);

    let app = app(AppState::new(store.clone()));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "running server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(());
    if let Err(e) = reaper.await {
        tracing::error!(error = %e, "reaper task panicked");
    }

    store.close().await;
    tracing::info!("bye");
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
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
