use anyhow::Context as _;
use sea_orm::Database;
use tokio::sync::watch;
use tracing::info;

use sentinel_auth::config::AuthConfig;
use sentinel_auth::router::build_router;
use sentinel_auth::state::AppState;
use sentinel_auth::usecase::credential::CredentialHasher;
use sentinel_auth::worker::spawn_cleanup_worker;
use sentinel_auth_types::token::TokenCodec;
use sentinel_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let config = AuthConfig::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("failed to create Redis pool")?;

    let hasher = CredentialHasher::with_cost(config.argon2_memory_kib, config.argon2_iterations)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState {
        db,
        redis,
        codec: TokenCodec::new(config.jwt_secret.as_bytes()),
        hasher,
        totp_issuer: config.totp_issuer,
        request_timeout: config.request_timeout,
        shutdown: shutdown_rx.clone(),
    };

    let cleanup = spawn_cleanup_worker(
        state.session_repo(),
        state.reset_token_repo(),
        config.cleanup_interval,
        shutdown_rx,
    );

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("auth service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("server error")?;

    cleanup.await.context("cleanup worker panicked")?;
    Ok(())
}
