//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the track catalog:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other crates depend on. It
//! establishes the configuration contract checked at startup and the logging
//! conventions used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, PlaylistStorage};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
