//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Synapse Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[provider]
# provider = "aipipe"     # aipipe (OpenRouter-style proxy) or openai
# api_key = ""            # empty = demo mode, no network calls
# model = ""              # empty = provider default
# max_tokens = 1500       # 1-128000
# base_url = ""           # overrides the provider endpoint

[logging]
# level = "INFO"          # TRACE, DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
