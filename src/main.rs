use mimalloc::MiMalloc;
use promptdesk::config::Config;
use promptdesk::server::{PromptdeskState, promptdesk_router};
use promptdesk::store::TemplateStore;
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_toml();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        static_dir = %cfg.basic.static_dir.display(),
        upstream = %cfg.upstream.base_url,
        model = %cfg.upstream.model,
        proxy = %cfg.upstream.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        api_key_set = !cfg.upstream.api_key.is_empty(),
    );

    let store =
        TemplateStore::open(&cfg.basic.database_url, cfg.basic.template_cache_capacity).await?;

    if let Some(seed_dir) = cfg.basic.seed_dir.as_ref() {
        if let Err(e) = promptdesk::seed::seed_if_empty(&store, seed_dir).await {
            warn!(path = %seed_dir.display(), error = %e, "config seeding failed");
        }
    }

    let state = PromptdeskState::new(store, &cfg)?;
    let app = promptdesk_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
