//! FIR Assistant Server Entry Point

use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use fir_assist_config::{load_domain_config, load_settings, DomainConfig, Settings};
use fir_assist_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var("FIR_ASSIST_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        },
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&settings);

    tracing::info!("Starting FIR Assistant Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?settings.environment,
        provider = settings.provider.kind.as_str(),
        "Configuration loaded"
    );

    let domain = load_domain(&settings)?;
    tracing::info!(
        jurisdiction = %domain.jurisdiction,
        legal_code = %domain.legal_code,
        categories = domain.taxonomy.len(),
        rules = domain.legal_rules.len(),
        "Loaded domain configuration"
    );

    let validation = settings.provider.validation();
    if !validation.is_valid {
        for error in &validation.errors {
            tracing::warn!(provider = validation.provider.as_str(), "{}", error);
        }
    }

    if settings.observability.metrics_enabled && init_metrics().is_some() {
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server host or port")?;

    let state = AppState::new(settings, domain);
    let cleanup = state.sessions.start_cleanup_task();
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn load_domain(settings: &Settings) -> anyhow::Result<DomainConfig> {
    let domain = match settings.domain_config_path.as_deref() {
        Some(path) if std::path::Path::new(path).exists() => load_domain_config(path)
            .with_context(|| format!("Failed to load domain configuration from {}", path))?,
        Some(path) => {
            tracing::warn!(path, "Domain configuration not found, using embedded reference");
            DomainConfig::reference()
        },
        None => DomainConfig::reference(),
    };
    domain.validate().context("Invalid domain configuration")?;
    Ok(domain)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("fir_assist={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber.with(fmt_layer).init();
}
