use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use forecourt_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "catalog.path",
        &config.catalog.path.display().to_string(),
        source("catalog.path", "FORECOURT_CATALOG_PATH"),
    ));

    lines.push(render_line(
        "messenger.enabled",
        &config.messenger.enabled.to_string(),
        source("messenger.enabled", "FORECOURT_MESSENGER_ENABLED"),
    ));
    lines.push(render_line(
        "messenger.verify_token",
        &redact_secret(config.messenger.verify_token.expose_secret()),
        source("messenger.verify_token", "FORECOURT_MESSENGER_VERIFY_TOKEN"),
    ));
    lines.push(render_line(
        "messenger.page_access_token",
        &redact_secret(config.messenger.page_access_token.expose_secret()),
        source("messenger.page_access_token", "FORECOURT_MESSENGER_PAGE_ACCESS_TOKEN"),
    ));
    lines.push(render_line(
        "messenger.api_base_url",
        &config.messenger.api_base_url,
        source("messenger.api_base_url", "FORECOURT_MESSENGER_API_BASE_URL"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "FORECOURT_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "FORECOURT_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", "FORECOURT_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ));

    lines.push(render_line(
        "session.evict_after_hours",
        &config.session.evict_after_hours.to_string(),
        source("session.evict_after_hours", "FORECOURT_SESSION_EVICT_AFTER_HOURS"),
    ));
    lines.push(render_line(
        "session.sweep_interval_secs",
        &config.session.sweep_interval_secs.to_string(),
        source("session.sweep_interval_secs", "FORECOURT_SESSION_SWEEP_INTERVAL_SECS"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "FORECOURT_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "FORECOURT_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("forecourt.toml"), PathBuf::from("config/forecourt.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

#[cfg(test)]
mod tests {
    use super::redact_secret;

    #[test]
    fn secrets_never_render_their_value() {
        assert_eq!(redact_secret(""), "<unset>");
        assert_eq!(redact_secret("   "), "<unset>");
        assert_eq!(redact_secret("page-token-value"), "<redacted>");
    }
}
