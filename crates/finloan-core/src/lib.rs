//! # finloan-core
//!
//! Core infrastructure for the FinLoan application wizard.
//!
//! This crate provides:
//! - [`FinloanError`] - Error type for configuration, logging and storage
//! - [`logging`] - Tracing setup writing JSON lines to `~/.finloan/logs/`
//! - [`config`] - YAML configuration with defaults
//! - [`storage`] - Best-effort local key/value storage
//!
//! ## Example
//!
//! ```no_run
//! use finloan_core::{FinloanConfig, LocalStorage};
//!
//! fn main() -> finloan_core::Result<()> {
//!     let _guard = finloan_core::init_logging(None, false)?;
//!     let config = FinloanConfig::load()?;
//!     let storage = LocalStorage::new(config.storage.resolve_dir()?);
//!     storage.save("greeting", &"hello");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::{FinloanConfig, FormConfig, StorageConfig};
pub use error::{FinloanError, Result};
pub use logging::{LogGuard, init_logging};
pub use storage::LocalStorage;
