//! Core module
//!
//! Shared configuration plumbing

mod config;

pub use config::{ConfigError, ConfigFile};
