//! HTTP server assembly
//!
//! `ServerBuilder` produces a `ServerHost` (transport-agnostic state) which
//! the REST exposure turns into an Axum router.

pub mod builder;
pub mod exposure;
pub mod host;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::ServerHost;
