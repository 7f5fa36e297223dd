//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the iCloud crates:
//! - Logging and tracing setup
//! - Configuration management with fail-fast validation
//!
//! The drive provider and the CLI both initialize through this crate so that
//! log filtering, redaction and transport defaults stay consistent.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
