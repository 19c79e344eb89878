use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use philogic_gateway::api::server::create_router;
use philogic_gateway::app_state::AppState;
use philogic_gateway::config::{Config, DEFAULT_AUTH_TOKEN};

// Loopback only; the Cloudflare tunnel exposes it.
const BIND_ADDR: &str = "127.0.0.1:8001";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    check_setup(&config)?;

    let state = Arc::new(AppState::new(config));
    let router = create_router(state);

    let listener = TcpListener::bind(BIND_ADDR).await?;
    tracing::info!("PhilogicAI server listening on http://{BIND_ADDR}");
    tracing::info!("  Health: GET  http://{BIND_ADDR}/health");
    tracing::info!("  Chat:   POST http://{BIND_ADDR}/api/chat");

    axum::serve(listener, router).await?;
    Ok(())
}

/// Validates the configuration before the listener is bound. A missing
/// executable or model file is fatal; a placeholder auth token is only a
/// warning. Test mode skips the path checks since it never spawns llama.cpp.
fn check_setup(config: &Config) -> Result<()> {
    tracing::info!("PhilogicAI server starting...");

    let mut missing = Vec::new();

    if config.test_mode {
        tracing::info!("Test mode enabled - skipping executable and model checks");
    } else {
        if config.llama_cpp_path.exists() {
            tracing::info!("llama-cli found: {}", config.llama_cpp_path.display());
        } else {
            missing.push(format!(
                "llama-cli not found: {}",
                config.llama_cpp_path.display()
            ));
        }

        match std::fs::metadata(&config.model_path) {
            Ok(meta) => {
                let size_gb = meta.len() as f64 / (1024u64.pow(3) as f64);
                tracing::info!("Model: {} ({size_gb:.1} GB)", config.model_name());
            }
            Err(_) => {
                missing.push(format!("Model not found: {}", config.model_path.display()));
            }
        }
    }

    if config.auth_token == DEFAULT_AUTH_TOKEN {
        tracing::warn!(
            "Default auth token in use - set PHILOGIC_AUTH_TOKEN before exposing this server"
        );
    }

    tracing::info!(
        "Config: max_tokens={} threads={} gpu_layers={} temperature={}",
        config.max_tokens,
        config.threads,
        config.gpu_layers,
        config.temperature
    );

    if !missing.is_empty() {
        for line in &missing {
            tracing::error!("{line}");
        }
        bail!("setup check failed: {}", missing.join("; "));
    }

    Ok(())
}
