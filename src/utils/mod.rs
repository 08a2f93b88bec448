//! Utility functions shared by the pipeline guards and handlers.
//!
//! - [`client_ip`] - Client identity extraction from headers and peer address
//! - [`clock`] - Injectable time source
//! - [`sanitize`] - Operator-key and markup stripping

pub mod client_ip;
pub mod clock;
pub mod sanitize;
