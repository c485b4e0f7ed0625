//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod chat;
mod service;
mod system;

pub use chat::*;
pub use service::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PplxConfig {
    pub service: ServiceConfig,
    pub chat: ChatParamsConfig,
    pub jitter: JitterConfig,
    pub storage: StorageConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}
