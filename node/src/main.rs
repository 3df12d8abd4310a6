// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Consensus Simulator
//!
//! Entry point for the `nova-node` binary: stands up a committee of
//! in-process validators under [`nova_protocol::config::SimulatorConfig`]
//! and runs them until interrupted. There is no CLI, no on-disk state, and
//! no RPC surface — the core this binary drives takes a fixed constructor
//! input, not ambient configuration (see the consensus crate's operator
//! surface notes).

mod logging;

use std::time::Duration;

use anyhow::Result;

use nova_protocol::config::SimulatorConfig;
use nova_protocol::consensus::node::{Committee, CommitteeConfig};

use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("nova_node=info,nova_protocol=info", LogFormat::Pretty);

    let config = SimulatorConfig::default();
    tracing::info!(
        num_validators = config.num_validators,
        len_ulb = config.len_ulb,
        consensus_kind = ?config.consensus_kind,
        "starting consensus simulation"
    );

    let genesis_time = tokio::time::Instant::now() + Duration::from_millis(200);
    let committee = Committee::spawn(
        CommitteeConfig {
            num_validators: config.num_validators,
            len_ulb: config.len_ulb,
            block_time: config.block_time,
            kind: config.consensus_kind,
            net_delay_min_ms: config.net_delay_min_ms,
            net_delay_max_ms: config.net_delay_max_ms,
        },
        genesis_time,
    )
    .await?;

    tokio::select! {
        _ = committee.join() => {
            tracing::warn!("all validator loops exited");
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
