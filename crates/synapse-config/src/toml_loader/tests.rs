//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use crate::schema::ProviderKind;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_synapse_config.toml"));
    assert!(matches!(
        result,
        Err(synapse_common::ConfigError::FileNotFound(_))
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[provider]
provider = "openai"
model = "gpt-4.1-mini"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.provider.provider, ProviderKind::OpenAi);
    assert_eq!(config.provider.model.as_deref(), Some("gpt-4.1-mini"));
    // Defaults preserved
    assert_eq!(config.provider.max_tokens, 1500);
    assert!(config.provider.api_key.is_empty());
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(
        result,
        Err(synapse_common::ConfigError::ParseError(_))
    ));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[provider]\nmax_tokens = 0\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.provider.max_tokens, 0);
}

#[test]
fn load_or_create_writes_commented_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("synapse").join("config.toml");

    let config = load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.provider.provider, ProviderKind::AiPipe);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("[provider]"));

    // The template itself parses back to defaults.
    let reloaded = load_from_path(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn default_config_path_ends_with_synapse_config() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("synapse/config.toml"));
    }
}

#[test]
fn create_default_config_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[provider]\nmax_tokens = 42\n").unwrap();

    assert!(create_default_config(&path).is_err());
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.provider.max_tokens, 42);
}
