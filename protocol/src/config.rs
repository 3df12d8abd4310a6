//! # Simulator Configuration
//!
//! Grounded on the original source's `config.Config`/`config.ConsensusConfig`
//! split: one small struct of knobs, a `Default` tuned for a believable
//! multi-validator run, and a `for_test` constructor tuned for fast,
//! deterministic test suites (original source: `DefaultConsensusConfig` vs.
//! `TestConsensusConfig`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consensus::strategy::ConsensusKind;

/// Tunables for one committee run. Changing `num_validators` or
/// `consensus_kind` mid-run isn't meaningful — these are genesis-time
/// parameters, not live config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Size of the validator committee. Must be at least 1; FBFT additionally
    /// requires `num_validators >= quorum()` (§4.7).
    pub num_validators: u32,
    /// Number of unconfirmed leading blocks a validator tolerates before a
    /// height counts as "confirmed" (§3, §4.3).
    pub len_ulb: u64,
    /// Target wall-clock time between successive block-production rounds.
    pub block_time: Duration,
    /// Which of the three voting strategies drives the committee.
    pub consensus_kind: ConsensusKind,
    /// Lower bound of the simulated per-message network delay.
    pub net_delay_min_ms: u64,
    /// Upper bound of the simulated per-message network delay.
    pub net_delay_max_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            num_validators: 4,
            len_ulb: 2,
            block_time: Duration::from_secs(2),
            consensus_kind: ConsensusKind::VrfBls,
            net_delay_min_ms: 50,
            net_delay_max_ms: 850,
        }
    }
}

impl SimulatorConfig {
    /// A small, fast, deterministic-ish configuration for tests: sub-second
    /// rounds and negligible simulated network delay.
    pub fn for_test(num_validators: u32, len_ulb: u64, consensus_kind: ConsensusKind) -> Self {
        Self {
            num_validators,
            len_ulb,
            block_time: Duration::from_millis(50),
            consensus_kind,
            net_delay_min_ms: 0,
            net_delay_max_ms: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_vrf_bls_with_four_validators() {
        let cfg = SimulatorConfig::default();
        assert_eq!(cfg.num_validators, 4);
        assert_eq!(cfg.consensus_kind, ConsensusKind::VrfBls);
    }

    #[test]
    fn test_config_has_no_ulb_pipelining() {
        let cfg = SimulatorConfig::for_test(3, 0, ConsensusKind::Simple);
        assert_eq!(cfg.len_ulb, 0);
        assert_eq!(cfg.num_validators, 3);
    }
}
