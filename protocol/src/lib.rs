// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Consensus — Core Library
//!
//! A round-based BFT-style consensus simulator: a fixed committee of
//! validators elects a block producer each height, proposes a block, and
//! carries it through a two-phase prepare/commit vote before finalizing it.
//!
//! ## Architecture
//!
//! - **crypto** — VRF-based producer election and BLS12-381 signature
//!   aggregation. Don't roll your own.
//! - **consensus** — The committee: block/vote types, the message bus,
//!   the blocking signature pool, the append-only store, per-validator
//!   status bookkeeping, producer election, the three voting strategies,
//!   and the runtime loop that ties them together.
//! - **config** — Simulation parameters: committee size, round length,
//!   `lenULB`, and which voting strategy is active.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance (but we're still fast).
//! 2. No unsafe code in crypto paths — we sleep at night.
//! 3. Every public API is documented. Internal shame is documented too.
//! 4. If it touches finality, it has tests. Plural.

pub mod config;
pub mod consensus;
pub mod crypto;
