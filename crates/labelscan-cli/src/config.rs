// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
pub const APP_NAME: &str = "labelscan";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub picker: Picker,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::default(),
            picker: Picker::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Backend {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Picker {
    pub start_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("LABELSCAN_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set LABELSCAN_CONFIG_PATH to the config file"
            )
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and keep values under [backend], [picker], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(endpoint) = &self.backend.endpoint {
            labelscan_client::validate_endpoint(endpoint)
                .with_context(|| format!("invalid [backend] in {}", path.display()))?;
        }

        if let Some(start_dir) = &self.picker.start_dir
            && start_dir.trim().is_empty()
        {
            bail!(
                "picker.start_dir in {} must not be empty; remove it to use the current directory",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level {level:?} in {} is not a valid filter; use error, warn, info, debug or trace",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        self.backend
            .endpoint
            .as_deref()
            .map(str::trim)
            .unwrap_or(labelscan_client::DEFAULT_ENDPOINT)
    }

    /// Picker start directory with `~` expanded; falls back to `cwd`.
    pub fn start_dir(&self, home: Option<&Path>, cwd: &Path) -> PathBuf {
        let Some(raw) = self.picker.start_dir.as_deref().map(str::trim) else {
            return cwd.to_path_buf();
        };
        if let Some(home) = home {
            if raw == "~" {
                return home.to_path_buf();
            }
            if let Some(rest) = raw.strip_prefix("~/") {
                return home.join(rest);
            }
        }
        cwd.join(raw)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# labelscan config\n# Place this file at: {}\n\nversion = 1\n\n[backend]\n# Analysis endpoint for this deployment. Default is the build-time endpoint.\nendpoint = \"{}\"\n\n[picker]\n# Optional. Directory the file prompt opens in. Default is the current directory.\n# start_dir = \"~/Pictures\"\n\n[log]\n# Filter directive for the log file; RUST_LOG overrides it.\nlevel = \"{}\"\n",
            path.display(),
            labelscan_client::DEFAULT_ENDPOINT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use anyhow::Result;
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.endpoint(), labelscan_client::DEFAULT_ENDPOINT);
        assert_eq!(config.log_level(), "info");
        assert_eq!(
            config.start_dir(None, Path::new("/work")),
            PathBuf::from("/work")
        );
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[backend]\nendpoint = \"http://localhost:8000\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[backend], [picker], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[backend]\nendpoint = \"http://localhost:8000/analyze\"\n[picker]\nstart_dir = \"~/Pictures\"\n[log]\nlevel = \"debug\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.endpoint(), "http://localhost:8000/analyze");
        assert_eq!(config.log_level(), "debug");
        assert_eq!(
            config.start_dir(Some(Path::new("/home/tester")), Path::new("/work")),
            PathBuf::from("/home/tester/Pictures")
        );
        Ok(())
    }

    #[test]
    fn relative_start_dir_resolves_against_cwd() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[picker]\nstart_dir = \"scans\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(
            config.start_dir(None, Path::new("/work")),
            PathBuf::from("/work/scans")
        );
        Ok(())
    }

    #[test]
    fn endpoint_must_be_absolute_http_url() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[backend]\nendpoint = \"/analyze\"\n")?;
        let error = Config::load(&path).expect_err("relative endpoint should fail");
        let message = format!("{error:#}");
        assert!(message.contains("invalid [backend]"), "unexpected: {message}");
        assert!(message.contains("not a valid URL"), "unexpected: {message}");

        let (_temp, path) =
            write_config("version = 1\n[backend]\nendpoint = \"ftp://example.com\"\n")?;
        let error = Config::load(&path).expect_err("ftp endpoint should fail");
        assert!(format!("{error:#}").contains("http or https"));
        Ok(())
    }

    #[test]
    fn empty_start_dir_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[picker]\nstart_dir = \"  \"\n")?;
        let error = Config::load(&path).expect_err("empty start_dir should fail");
        assert!(error.to_string().contains("must not be empty"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"app=extreme\"\n")?;
        let error = Config::load(&path).expect_err("bad level should fail");
        assert!(error.to_string().contains("not a valid filter"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("LABELSCAN_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("LABELSCAN_CONFIG_PATH");
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("LABELSCAN_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("labelscan/config.toml"));
        Ok(())
    }

    #[test]
    fn example_config_loads_cleanly() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[backend]"));
        assert!(example.contains("[picker]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.endpoint(), labelscan_client::DEFAULT_ENDPOINT);
        Ok(())
    }
}
