//! Configuration schema types for Synapse.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod provider;

pub use logging::*;
pub use provider::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Synapse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SynapseConfig {
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}
