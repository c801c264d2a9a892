use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::CoachError;

pub const DEFAULT_SETTINGS_FILE: &str = "coach.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            auth_token: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    auth_token: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Parsed and validated API base URL.
    pub fn api_base(&self) -> Result<Url, CoachError> {
        let url = Url::parse(self.api_url.trim())
            .map_err(|e| CoachError::Config(format!("api_url '{}': {e}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoachError::Config(format!(
                "api_url '{}' must use http or https",
                self.api_url
            )));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Defaults, then `coach.toml` in the working directory, then environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(DEFAULT_SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Merges an optional settings file; a missing or unparsable file is
/// skipped.
pub fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => merge_file(settings, file_cfg),
        Err(err) => warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
    }
}

/// Merges a settings file the user named explicitly. It must exist and parse.
pub fn apply_required_file(settings: &mut Settings, path: &Path) -> Result<(), CoachError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CoachError::Config(format!("reading {}: {e}", path.display())))?;
    let file_cfg = toml::from_str::<FileSettings>(&raw)
        .map_err(|e| CoachError::Config(format!("parsing {}: {e}", path.display())))?;
    merge_file(settings, file_cfg);
    Ok(())
}

fn merge_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.auth_token {
        settings.auth_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
}

pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("COACH_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("COACH_TOKEN") {
        settings.auth_token = Some(v);
    }
    if let Some(v) = lookup("APP__TOKEN") {
        settings.auth_token = Some(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__REQUEST_TIMEOUT_SECS"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
