//! CLI command implementations.

pub mod peer;
pub mod relay;
