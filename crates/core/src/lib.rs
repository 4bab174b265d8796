//! Core types and configuration for the coinset dataset builder.
//!
//! This crate provides shared types used across all other crates:
//! - Snapshot, coin and experiment types
//! - Dataset configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{DatasetConfig, SourceConfig};
pub use error::{Error, Result};
pub use types::*;
