//! # nginx-mesh-core
//!
//! Core library for the NGINX mesh adapter providing:
//! - Runtime configuration types (server addresses, release feed, endpoints)
//! - Hierarchical configuration loading with embedded defaults
//! - Shared error types

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
