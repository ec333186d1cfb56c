use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use coordinator::ConflictPolicy;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "roster.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_ms: u64,
    pub conflict_policy: ConflictPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            request_timeout_ms: 10_000,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_ms: Option<u64>,
    conflict_policy: Option<String>,
}

/// Flag values that, when present, override file and environment settings.
#[derive(Debug, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub conflict_policy: Option<ConflictPolicy>,
}

/// Defaults, then the settings file, then the environment, then `overrides`.
///
/// A missing file is only an error when its path was given explicitly.
pub fn load_settings(explicit: Option<&Path>, overrides: Overrides) -> anyhow::Result<Settings> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

    let mut settings = Settings::default();
    match fs::read_to_string(&path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound && explicit.is_none() => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    settings.apply_overrides(overrides);
    Ok(settings)
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = file_cfg.conflict_policy {
            self.conflict_policy = v.parse().map_err(|err: String| anyhow!(err))?;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("ROSTER_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = v;
        }

        for key in ["ROSTER_TIMEOUT_MS", "APP__REQUEST_TIMEOUT_MS"] {
            if let Some(v) = lookup(key) {
                self.request_timeout_ms = v
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} must be a whole number of milliseconds"))?;
            }
        }

        for key in ["ROSTER_CONFLICT_POLICY", "APP__CONFLICT_POLICY"] {
            if let Some(v) = lookup(key) {
                self.conflict_policy = v
                    .parse()
                    .map_err(|err: String| anyhow!(err))
                    .with_context(|| format!("invalid {key}"))?;
            }
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.server_url {
            self.server_url = v;
        }
        if let Some(v) = overrides.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = overrides.conflict_policy {
            self.conflict_policy = v;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
