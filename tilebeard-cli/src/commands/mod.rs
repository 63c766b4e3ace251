//! CLI command implementations.

pub mod cache;
pub mod cluster;
pub mod fetch;
