//! Config validation.
//!
//! Every check runs; failures are collected into one `ConfigError`.

use synapse_common::ConfigError;

use crate::schema::SynapseConfig;

/// Largest `max_tokens` accepted.
pub const MAX_TOKENS_CEILING: u32 = 128_000;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &SynapseConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "provider.max_tokens",
        config.provider.max_tokens,
        1,
        MAX_TOKENS_CEILING,
    );

    if let Some(url) = config.provider.base_url.as_deref() {
        let url = url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!(
                "provider.base_url = {url:?} must start with http:// or https://"
            ));
        }
    }

    if config.provider.api_key.chars().any(char::is_control) {
        errors.push("provider.api_key contains control characters".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&SynapseConfig::default()).is_ok());
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let mut config = SynapseConfig::default();
        config.provider.max_tokens = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("provider.max_tokens = 0"), "got: {err}");
    }

    #[test]
    fn bad_base_url_rejected() {
        let mut config = SynapseConfig::default();
        config.provider.base_url = Some("ftp://example.com".into());
        assert!(validate(&config).is_err());

        config.provider.base_url = Some("http://localhost:8080/v1/chat/completions".into());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn errors_are_collected() {
        let mut config = SynapseConfig::default();
        config.provider.max_tokens = 500_000;
        config.provider.api_key = "sk-\nbad".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_tokens"));
        assert!(err.contains("control characters"));
    }
}
