use std::env;
use std::fs;
use std::path::Path;

use lightquote_core::config::{detect_config_path, AppConfig, LoadOptions, LogFormat};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "extraction.url",
        &redact_url(config.extraction.url.as_ref()),
        source("extraction.url", &["LIGHTQUOTE_EXTRACTION_URL"]),
    ));
    lines.push(render_line(
        "extraction.timeout_secs",
        &config.extraction.timeout_secs.to_string(),
        source("extraction.timeout_secs", &["LIGHTQUOTE_EXTRACTION_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "submission.url",
        &redact_url(config.submission.url.as_ref()),
        source("submission.url", &["LIGHTQUOTE_SUBMISSION_URL"]),
    ));
    lines.push(render_line(
        "submission.timeout_secs",
        &config.submission.timeout_secs.to_string(),
        source("submission.timeout_secs", &["LIGHTQUOTE_SUBMISSION_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "retry.max_retries",
        &config.retry.max_retries.to_string(),
        source("retry.max_retries", &["LIGHTQUOTE_RETRY_MAX_RETRIES"]),
    ));
    lines.push(render_line(
        "retry.backoff_ms",
        &config.retry.backoff_ms.to_string(),
        source("retry.backoff_ms", &["LIGHTQUOTE_RETRY_BACKOFF_MS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["LIGHTQUOTE_LOGGING_LEVEL", "LIGHTQUOTE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        log_format_name(config.logging.format),
        source("logging.format", &["LIGHTQUOTE_LOGGING_FORMAT", "LIGHTQUOTE_LOG_FORMAT"]),
    ));

    CommandResult::success("config", lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

/// Keeps scheme and host; webhook paths usually carry the access token.
fn redact_url(url: Option<&SecretString>) -> String {
    let Some(url) = url else {
        return "<unset>".to_string();
    };

    let trimmed = url.expose_secret().trim();
    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            format!("{scheme}://{host}/***")
        }
        None => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::redact_url;

    #[test]
    fn redaction_keeps_only_scheme_and_host() {
        let url = SecretString::from("https://hooks.example.com/webhook/67c28f9b?token=abc");

        assert_eq!(redact_url(Some(&url)), "https://hooks.example.com/***");
        assert_eq!(redact_url(None), "<unset>");
    }
}
