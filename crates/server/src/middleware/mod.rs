//! HTTP middleware components for the gateway.
//!
//! Admission itself lives in `protect_core::admission`; this module only
//! resolves the origin it is applied to and adds the response headers every
//! route shares.

pub mod cors;
pub mod origin;

pub use cors::create_cors_layers;
pub use origin::ClientOrigin;
