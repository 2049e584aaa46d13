// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fasal serve`: wires every component from configuration and runs the
//! HTTP server until SIGINT or SIGTERM.

use std::sync::Arc;

use fasal_config::FasalConfig;
use fasal_core::{FasalError, KnowledgeBase};
use fasal_gateway::AppState;
use fasal_knowledge::StaticKnowledgeBase;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run_serve(config: FasalConfig) -> Result<(), FasalError> {
    init_tracing(&config.server.log_level);
    info!("starting fasal serve");

    let kb: Arc<dyn KnowledgeBase> = Arc::new(StaticKnowledgeBase::builtin()?);
    let state = AppState::from_config(&config, kb)?;
    let status = state.pipeline.status();
    info!(
        engines = ?status.engines.iter().map(|e| e.engine).collect::<Vec<_>>(),
        translator = status.translator,
        archive = status.archive,
        diseases = status.diseases,
        "pipeline ready"
    );

    let cancel = install_signal_handler();
    fasal_gateway::start_server(&config.server.host, config.server.port, state, async move {
        cancel.cancelled().await;
    })
    .await?;

    info!("fasal serve shutdown complete");
    Ok(())
}

/// Returns a token cancelled on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "could not install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

/// Prints the effective configuration without secrets.
pub fn print_config_summary(config: &FasalConfig) {
    let enabled = |on: bool| if on { "enabled" } else { "disabled" };
    println!("fasal: configuration OK");
    println!("  server:       {}:{}", config.server.host, config.server.port);
    println!(
        "  vision:       {} ({})",
        enabled(config.vision.api_key.is_some() || config.vision.bearer_token.is_some()),
        config.vision.model
    );
    println!("  labels:       {}", enabled(config.labels.api_key.is_some()));
    println!("  translation:  {}", enabled(config.translate.api_key.is_some()));
    println!(
        "  breaker:      {} failures, {}s cool-down",
        config.breaker.failure_threshold, config.breaker.cooldown_secs
    );
    println!(
        "  archive:      {} ({})",
        enabled(config.archive.enabled),
        config.archive.root
    );
    println!(
        "  whatsapp:     meta {}, twilio {}",
        enabled(config.whatsapp.meta.access_token.is_some()),
        enabled(config.whatsapp.twilio.auth_token.is_some())
    );
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so `fasal diagnose` can print JSON on stdout.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fasal={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
