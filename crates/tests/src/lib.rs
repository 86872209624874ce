//! Integration Tests for the Protect RPC Gateway
//!
//! - `gateway_flow_tests`: full HTTP round trips through a live gateway against
//!   mockito relay and proxy servers
//! - `sweeper_lifecycle_tests`: dedup sweeper start, eviction and shutdown
//! - `mock_infrastructure`: reusable relay/proxy mocks and the test gateway
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod gateway_flow_tests;

#[cfg(test)]
mod sweeper_lifecycle_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
