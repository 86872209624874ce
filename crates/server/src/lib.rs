//! HTTP front end for the Protect RPC gateway.
//!
//! [`gateway::GatewayServer`] owns the process-wide state and builds the axum
//! router; [`router`] holds the handlers and [`middleware`] the origin
//! extractor and CORS layers.

pub mod gateway;
pub mod middleware;
pub mod router;

pub use gateway::{GatewayBuilder, GatewayError, GatewayServer, GatewayState};
