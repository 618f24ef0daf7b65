//! Holodeck API Server
//!
//! Main entry point for the Holodeck art submission service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use holodeck_api::{AppState, UploadLimits, create_router};
use holodeck_core::analysis::{OpenAiAnalyzer, OpenAiConfig};
use holodeck_core::art::ArtService;
use holodeck_core::rate_limit::{RateLimitConfig, RateLimiter};
use holodeck_core::storage::{StorageBackend, StorageConfig, StorageService};
use holodeck_shared::AppConfig;
use holodeck_shared::config::{AnalysisSettings, RateLimitSettings, StorageKind, StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holodeck=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    let storage = StorageService::from_config(storage_config(&config.storage))?;
    info!(
        backend = storage.backend_name(),
        bucket = storage.bucket(),
        "Storage service configured"
    );

    let analyzer = OpenAiAnalyzer::new(analyzer_config(&config.analysis))?;
    info!(model = %config.analysis.model, "Analyzer configured");

    let rate_limiter = RateLimiter::start(rate_limit_config(&config.rate_limit));

    let art = ArtService::new(Arc::new(storage), Arc::new(analyzer))
        .with_branch_timeout(Duration::from_secs(config.submission.branch_timeout_secs));

    // Create application state
    let state = AppState {
        art: Arc::new(art),
        rate_limiter: Arc::clone(&rate_limiter),
        limits: UploadLimits {
            max_image_bytes: config.submission.max_image_bytes,
            max_form_bytes: config.submission.max_form_bytes,
        },
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let drain = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(drain.cancelled_owned())
        .await
    });

    tokio::select! {
        joined = &mut server => joined??,
        () = shutdown.cancelled() => {
            let grace = Duration::from_secs(config.server.shutdown_grace_secs);
            info!(grace = ?grace, "Shutdown signal received, draining requests");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => joined??,
                Err(_) => {
                    warn!("Grace period elapsed, aborting remaining requests");
                    server.abort();
                }
            }
        }
    }

    rate_limiter.shutdown();
    info!("Server stopped");
    Ok(())
}

fn storage_config(settings: &StorageSettings) -> StorageConfig {
    let backend = match settings.provider {
        StorageKind::S3 => StorageBackend::s3(
            &settings.endpoint,
            &settings.bucket,
            &settings.access_key_id,
            &settings.secret_access_key,
            &settings.region,
        ),
        StorageKind::LocalFs => StorageBackend::local_fs(&settings.root),
        StorageKind::Memory => StorageBackend::Memory,
    };

    let config = StorageConfig::new(backend).with_signed_url_ttl(settings.signed_url_ttl_secs);
    match &settings.public_base_url {
        Some(url) => config.with_public_base_url(url.clone()),
        None => config,
    }
}

fn analyzer_config(settings: &AnalysisSettings) -> OpenAiConfig {
    OpenAiConfig {
        api_key: settings.api_key.clone(),
        base_url: settings.base_url.clone(),
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        timeout: Duration::from_secs(settings.timeout_secs),
    }
}

fn rate_limit_config(settings: &RateLimitSettings) -> RateLimitConfig {
    RateLimitConfig::with_window(Duration::from_secs(settings.window_secs))
        .retention(Duration::from_secs(settings.retention_secs))
        .sweep_every(Duration::from_secs(settings.sweep_interval_secs))
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    shutdown.cancel();
}
