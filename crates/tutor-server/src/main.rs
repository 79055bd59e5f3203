use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tutor_api::{AppStateInner, Config};
use tutor_llm::{LlmClient, MistralClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor=debug,tutor_api=debug,tutor_db=info,tutor_llm=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Config: db={} model={} api_key_set={} frontend={}",
        config.db_path,
        config.mistral_model,
        config.mistral_api_key.is_some(),
        config.frontend_url
    );

    // Init database
    let db = tutor_db::Database::new(PathBuf::from(&config.db_path));
    db.connect()?;

    let llm: Option<Arc<dyn LlmClient>> = match &config.mistral_api_key {
        Some(key) => Some(Arc::new(MistralClient::new(
            key.clone(),
            config.mistral_model.clone(),
            config.mistral_base_url.clone(),
        ))),
        None => {
            warn!("MISTRAL_API_KEY is not set; chat and quiz generation will fail");
            None
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&config.frontend_url)?)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let addr: SocketAddr = config.server_addr().parse()?;
    let state = AppStateInner::new(db, config, llm);

    let app = tutor_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!("Tutor server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
