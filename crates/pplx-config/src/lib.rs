//! Configuration for the pplx chat client.
//!
//! TOML-based, with every section defaulted so partial files work.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pplx_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config.service.base_url);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

use std::path::Path;

pub use schema::{PplxConfig, CONFIG_SCHEMA_VERSION};

use pplx_common::ConfigError;

/// Load config from `path`, or from the platform default path (created on
/// first run) when none is given.
///
/// Values that fail validation are returned as parsed; only unreadable or
/// unparsable files are errors.
pub fn load_config(path: Option<&Path>) -> Result<PplxConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}
