use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "lightquote.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub extraction: WebhookConfig,
    pub submission: WebhookConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// One outbound webhook. Its URL usually embeds an access token, so it is kept secret.
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub url: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub extraction_url: Option<String>,
    pub submission_url: Option<String>,
    pub max_retries: Option<u32>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extraction: WebhookConfig { url: None, timeout_secs: 120 },
            submission: WebhookConfig { url: None, timeout_secs: 30 },
            retry: RetryConfig { max_retries: 1, backoff_ms: 500 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(extraction) = patch.extraction {
            extraction.apply_to(&mut self.extraction);
        }
        if let Some(submission) = patch.submission {
            submission.apply_to(&mut self.submission);
        }

        if let Some(retry) = patch.retry {
            if let Some(max_retries) = retry.max_retries {
                self.retry.max_retries = max_retries;
            }
            if let Some(backoff_ms) = retry.backoff_ms {
                self.retry.backoff_ms = backoff_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LIGHTQUOTE_EXTRACTION_URL") {
            self.extraction.url = Some(secret_value(value));
        }
        if let Some(value) = read_env("LIGHTQUOTE_EXTRACTION_TIMEOUT_SECS") {
            self.extraction.timeout_secs = parse_u64("LIGHTQUOTE_EXTRACTION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("LIGHTQUOTE_SUBMISSION_URL") {
            self.submission.url = Some(secret_value(value));
        }
        if let Some(value) = read_env("LIGHTQUOTE_SUBMISSION_TIMEOUT_SECS") {
            self.submission.timeout_secs = parse_u64("LIGHTQUOTE_SUBMISSION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LIGHTQUOTE_RETRY_MAX_RETRIES") {
            self.retry.max_retries = parse_u32("LIGHTQUOTE_RETRY_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("LIGHTQUOTE_RETRY_BACKOFF_MS") {
            self.retry.backoff_ms = parse_u64("LIGHTQUOTE_RETRY_BACKOFF_MS", &value)?;
        }

        let log_level =
            read_env("LIGHTQUOTE_LOGGING_LEVEL").or_else(|| read_env("LIGHTQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LIGHTQUOTE_LOGGING_FORMAT").or_else(|| read_env("LIGHTQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(extraction_url) = overrides.extraction_url {
            self.extraction.url = Some(secret_value(extraction_url));
        }
        if let Some(submission_url) = overrides.submission_url {
            self.submission.url = Some(secret_value(submission_url));
        }
        if let Some(max_retries) = overrides.max_retries {
            self.retry.max_retries = max_retries;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_webhook("extraction", &self.extraction)?;
        validate_webhook("submission", &self.submission)?;
        validate_retry(&self.retry)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

/// The config file `load` would read, if any.
pub fn detect_config_path() -> Option<PathBuf> {
    resolve_config_path(None)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_webhook(name: &str, webhook: &WebhookConfig) -> Result<(), ConfigError> {
    if let Some(url) = &webhook.url {
        let url = url.expose_secret().trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{name}.url must start with http:// or https://"
            )));
        }
    }

    if webhook.timeout_secs == 0 || webhook.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "{name}.timeout_secs must be in range 1..=300"
        )));
    }

    Ok(())
}

fn validate_retry(retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_retries > 3 {
        return Err(ConfigError::Validation(
            "retry.max_retries must be in range 0..=3".to_string(),
        ));
    }

    if retry.backoff_ms > 60_000 {
        return Err(ConfigError::Validation(
            "retry.backoff_ms must not exceed 60000".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    extraction: Option<WebhookPatch>,
    submission: Option<WebhookPatch>,
    retry: Option<RetryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

impl WebhookPatch {
    fn apply_to(self, webhook: &mut WebhookConfig) {
        if let Some(url) = self.url {
            webhook.url = Some(secret_value(url));
        }
        if let Some(timeout_secs) = self.timeout_secs {
            webhook.timeout_secs = timeout_secs;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RetryPatch {
    max_retries: Option<u32>,
    backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
