//! # Protect Core
//!
//! Core library for the Protect RPC gateway, a JSON-RPC front door that keeps
//! user transactions out of the public mempool by submitting them to a private
//! relay.
//!
//! This crate provides:
//!
//! - **[`admission`]**: Origin blacklist consulted before any request is processed.
//!
//! - **[`dedup`]**: Time-bounded record of transactions already forwarded to the
//!   relay, with an atomic claim operation and a background sweeper.
//!
//! - **[`processor`]**: The [`RequestProcessor`](processor::RequestProcessor) seam
//!   and its default implementation, which signs transactions for the relay and
//!   proxies everything else.
//!
//! - **[`signing`]**: secp256k1 relay authentication (`X-Flashbots-Signature`).
//!
//! - **[`health`]**: Liveness report with process start time and version.
//!
//! - **[`metrics`]**: Prometheus metrics collection.
//!
//! - **[`config`]**: Layered configuration (defaults, TOML file, environment).
//!
//! ## Request Flow
//!
//! ```text
//! Client POST /
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Blacklist  │ ─── Match ──► 403
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ CompatFixer │
//! └──────┬──────┘
//!        │
//!        ▼
//!  eth_sendRawTransaction? ─── No ──► Proxy (verbatim)
//!        │ Yes
//!        ▼
//! ┌─────────────┐
//! │ DedupCache  │ ─── Seen ──► tx hash
//! └──────┬──────┘
//!        │ Claimed
//!        ▼
//!  Signed relay submission
//! ```

pub mod admission;
pub mod clock;
pub mod compat;
pub mod config;
pub mod dedup;
pub mod health;
pub mod metrics;
pub mod processor;
pub mod signing;
pub mod types;
