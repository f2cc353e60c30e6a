//! Synapse configuration system.
//!
//! TOML-based configuration with defaults for every field, validation,
//! atomic saves, environment overrides and live reload. The process-wide
//! [`Settings`] value is the single owner of the current config.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use synapse_config::Settings;
//!
//! let settings = Settings::load_default().expect("failed to load config");
//! let provider = settings.provider();
//! println!("{} / {}", provider.provider, provider.resolved_model());
//! ```

pub mod reload;
pub mod schema;
pub mod settings;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;

pub use reload::ReloadManager;
pub use schema::{
    LogLevel, LoggingConfig, ProviderConfig, ProviderKind, SynapseConfig, CONFIG_SCHEMA_VERSION,
    DEFAULT_MAX_TOKENS,
};
pub use settings::{ProviderOverrides, Settings};
pub use toml_writer::{save_config, save_config_to_path};

/// Serialize a config to pretty-printed JSON with the API key masked.
pub fn config_to_json(config: &SynapseConfig) -> String {
    let mut masked = config.clone();
    if !masked.provider.api_key.is_empty() {
        masked.provider.api_key = "********".into();
    }
    serde_json::to_string_pretty(&masked)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
