//! Process-wide settings state.
//!
//! [`Settings`] owns the current [`SynapseConfig`] and its backing file.
//! Readers take cheap snapshots; a turn reads one [`ProviderConfig`]
//! snapshot up front and never sees later edits. Environment and CLI
//! overrides are layered on top of the file config at snapshot time and
//! are never written back to disk.

use std::path::{Path, PathBuf};

use synapse_common::ConfigError;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::schema::{ProviderConfig, ProviderKind, SynapseConfig};
use crate::toml_loader;
use crate::toml_writer::save_config_to_path;
use crate::validation;

pub const ENV_PROVIDER: &str = "SYNAPSE_PROVIDER";
pub const ENV_API_KEY: &str = "SYNAPSE_API_KEY";
pub const ENV_MODEL: &str = "SYNAPSE_MODEL";
pub const ENV_MAX_TOKENS: &str = "SYNAPSE_MAX_TOKENS";

/// Provider fields that take precedence over the config file.
#[derive(Clone, Default, PartialEq)]
pub struct ProviderOverrides {
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

impl std::fmt::Debug for ProviderOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderOverrides")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ProviderOverrides {
    /// Read overrides from `SYNAPSE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = non_empty(ENV_PROVIDER).and_then(|v| match v.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!("ignoring {ENV_PROVIDER}: {e}");
                None
            }
        });
        let max_tokens = non_empty(ENV_MAX_TOKENS).and_then(|v| match v.trim().parse() {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!("ignoring {ENV_MAX_TOKENS}={v}: {e}");
                None
            }
        });

        Self {
            provider,
            api_key: non_empty(ENV_API_KEY).map(|v| v.trim().to_string()),
            model: non_empty(ENV_MODEL),
            max_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Later non-empty fields win.
    pub fn merge(mut self, other: ProviderOverrides) -> Self {
        self.provider = other.provider.or(self.provider);
        self.api_key = other.api_key.or(self.api_key);
        self.model = other.model.or(self.model);
        self.max_tokens = other.max_tokens.or(self.max_tokens);
        self
    }

    pub fn apply(&self, config: &mut ProviderConfig) {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(ref key) = self.api_key {
            config.api_key = key.clone();
        }
        if let Some(ref model) = self.model {
            config.model = Some(model.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
    }
}

/// Shared configuration state with an explicit load/save/reset lifecycle.
pub struct Settings {
    path: Option<PathBuf>,
    overrides: ProviderOverrides,
    tx: watch::Sender<SynapseConfig>,
}

impl Settings {
    /// Settings that live only in memory; `save` is a no-op.
    pub fn in_memory(config: SynapseConfig) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self {
            path: None,
            overrides: ProviderOverrides::default(),
            tx,
        }
    }

    /// Load settings from `path`, creating a default file if needed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = toml_loader::load_or_create(&path)?;
        let (tx, _rx) = watch::channel(config);
        Ok(Self {
            path: Some(path),
            overrides: ProviderOverrides::default(),
            tx,
        })
    }

    /// Load settings from the platform default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(toml_loader::default_config_path()?)
    }

    pub fn with_overrides(mut self, overrides: ProviderOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn overrides(&self) -> &ProviderOverrides {
        &self.overrides
    }

    /// The file-level config, without overrides.
    pub fn config(&self) -> SynapseConfig {
        self.tx.borrow().clone()
    }

    /// Immutable provider snapshot with overrides applied.
    pub fn provider(&self) -> ProviderConfig {
        let mut provider = self.tx.borrow().provider.clone();
        self.overrides.apply(&mut provider);
        provider
    }

    /// Receive every config replacement (set, update, reset, reload).
    pub fn subscribe(&self) -> watch::Receiver<SynapseConfig> {
        self.tx.subscribe()
    }

    pub fn set(&self, config: SynapseConfig) {
        self.tx.send_replace(config);
        debug!("settings replaced");
    }

    /// Edit the config in place. Validation happens on `save`.
    pub fn update(&self, edit: impl FnOnce(&mut SynapseConfig)) {
        self.tx.send_modify(edit);
        debug!("settings updated");
    }

    /// Validate and persist the file-level config.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config = self.config();
        validation::validate(&config)?;
        match self.path {
            Some(ref path) => save_config_to_path(&config, path),
            None => {
                debug!("in-memory settings, nothing to save");
                Ok(())
            }
        }
    }

    /// Restore defaults and delete the stored config file.
    pub fn reset(&self) -> Result<(), ConfigError> {
        self.tx.send_replace(SynapseConfig::default());
        if let Some(ref path) = self.path {
            match std::fs::remove_file(path) {
                Ok(()) => info!("removed config file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ConfigError::ParseError(format!(
                        "failed to remove {}: {e}",
                        path.display()
                    )))
                }
            }
        }
        Ok(())
    }

    /// Re-read the backing file. Invalid files leave the current config
    /// untouched.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let config = toml_loader::load_from_path(path)?;
        validation::validate(&config)?;
        self.set(config);
        info!("reloaded config from {}", path.display());
        Ok(())
    }
}
