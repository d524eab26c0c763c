use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://localhost:7275".to_string()
}
fn default_request_timeout() -> u64 { 10_000 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: None,
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Explicit `ws_url`, or the API host with a ws scheme and the
    /// notifications path.
    pub fn notifications_url(&self) -> String {
        if let Some(url) = self.ws_url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws/notifications", ws_base)
    }
}

/// Live view polling and the client-side status cutoffs used when the
/// server does not send a status label.
#[derive(Debug, Deserialize, Clone)]
pub struct LiveConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_s: u64,
    #[serde(default = "default_regulation_minutes")]
    pub regulation_minutes: f64,
    #[serde(default = "default_very_likely")]
    pub very_likely_ratio: f64,
    #[serde(default = "default_likely")]
    pub likely_ratio: f64,
    #[serde(default = "default_possible")]
    pub possible_ratio: f64,
}

fn default_poll_interval() -> u64 { 180 }
fn default_regulation_minutes() -> f64 { 48.0 }
fn default_very_likely() -> f64 { 0.75 }
fn default_likely() -> f64 { 1.0 }
fn default_possible() -> f64 { 1.35 }

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_s: default_poll_interval(),
            regulation_minutes: default_regulation_minutes(),
            very_likely_ratio: default_very_likely(),
            likely_ratio: default_likely(),
            possible_ratio: default_possible(),
        }
    }
}

impl LiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_s.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("basketbet.log")
}
fn default_log_filter() -> String {
    "basketbet_pro=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_file")]
    pub file: PathBuf,
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".basketbet-session.json")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { file: default_session_file() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Missing file means defaults; a file that exists but fails to parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// `BASKETBET_API_URL` and `BASKETBET_WS_URL` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BASKETBET_API_URL") {
            let url = sanitize_value(&url);
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(url) = std::env::var("BASKETBET_WS_URL") {
            let url = sanitize_value(&url);
            if !url.is_empty() {
                self.api.ws_url = Some(url);
            }
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Login email from `BASKETBET_EMAIL`, or prompted and saved to .env.
    pub fn login_email() -> Result<String> {
        match std::env::var("BASKETBET_EMAIL") {
            Ok(email) if !email.trim().is_empty() => Ok(sanitize_value(&email)),
            _ => {
                let email = prompt("E-mail")?;
                save_env_var("BASKETBET_EMAIL", &email);
                Ok(email)
            }
        }
    }

    /// Passwords are never written to .env.
    pub fn password(label: &str, env_key: &str) -> Result<String> {
        match std::env::var(env_key) {
            Ok(p) if !p.is_empty() => Ok(p),
            _ => prompt(label),
        }
    }
}

pub fn prompt(label: &str) -> Result<String> {
    print!("  {} > ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let value = input.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}

/// KEY=VALUE pairs from a .env body; comments, blanks and quotes stripped.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().to_string(),
                value.trim().trim_matches('"').trim_matches('\'').to_string(),
            )
        })
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a value.
fn sanitize_value(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Append a KEY=VALUE line to .env and set it in the current process.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let mut contents = std::fs::read_to_string(path).unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("{}={}\n", key, value));
    if let Err(e) = std::fs::write(path, contents) {
        tracing::warn!(error = %e, "failed to persist {} to .env", key);
    }
}
