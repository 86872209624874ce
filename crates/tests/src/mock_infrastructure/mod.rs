//! Mock Infrastructure for Testing the Protect RPC Gateway
//!
//! ## Components
//!
//! - `RelayMockBuilder`: mockito relay accepting or rejecting private transactions
//! - `ProxyMockBuilder`: mockito node answering ordinary JSON-RPC methods
//! - `TestGateway`: a real gateway on a loopback ephemeral port
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{RelayMockBuilder, TestGateway, test_config};
//!
//! let mut relay = RelayMockBuilder::new().await;
//! let mock = relay.mock_accept(RAW_TX, 1).await;
//! let gateway = TestGateway::spawn(&test_config("http://unused", &relay.url()), None).await;
//! ```

pub mod relay_mock;

pub use relay_mock::{ProxyMockBuilder, RelayMockBuilder};
pub use test_helpers::*;
