use std::{collections::HashMap, fs, io::ErrorKind};

use anyhow::Context;
use serde::Deserialize;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(SETTINGS_FILE) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to parse {SETTINGS_FILE}"))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {SETTINGS_FILE}"));
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

impl Settings {
    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
        if let Some(v) = file_cfg.get("bind_addr") {
            self.server_bind = v.clone();
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SERVER_BIND") {
            self.server_bind = v;
        }
        if let Some(v) = lookup("APP__BIND_ADDR") {
            self.server_bind = v;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
