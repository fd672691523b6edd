//! Configuration handling for the TUI

use crate::visibility::DependencyMatch;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default catalog location, relative to the working directory
const DEFAULT_CATALOG_PATH: &str = "form.csv";
/// Default intake server address
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_TEXT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// User configuration for the TUI. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Field catalog file
    pub catalog_path: Option<PathBuf>,
    /// Intake server base URL
    pub server_url: Option<String>,
    /// Quiet period before a text edit commits
    pub text_debounce_ms: Option<u64>,
    /// Quiet period before answers are autosaved
    pub autosave_delay_ms: Option<u64>,
    /// How dependency values are compared with checkbox answers
    pub dependency_match: Option<DependencyMatch>,
    pub request_timeout_secs: Option<u64>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub server_url: String,
    pub text_debounce: Duration,
    pub autosave_delay: Duration,
    pub dependency_match: DependencyMatch,
    pub request_timeout: Duration,
    /// Directory for the local store and log file
    pub data_dir: PathBuf,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "intake", "intake-tui")
}

impl IntakeConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the user config file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`; a missing file is the default config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Apply `INTAKE_CATALOG_PATH` and `INTAKE_SERVER_URL`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("INTAKE_CATALOG_PATH").ok(),
            std::env::var("INTAKE_SERVER_URL").ok(),
        )
    }

    fn with_overrides(mut self, catalog_path: Option<String>, server_url: Option<String>) -> Self {
        if let Some(path) = catalog_path.filter(|p| !p.is_empty()) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(url) = server_url.filter(|u| !u.is_empty()) {
            self.server_url = Some(url);
        }
        self
    }

    /// Fill in defaults. `data_dir` falls back to the working directory when
    /// the platform has no home directory.
    pub fn resolve(self) -> Settings {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        self.resolve_in(data_dir)
    }

    fn resolve_in(self, data_dir: PathBuf) -> Settings {
        Settings {
            catalog_path: self
                .catalog_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            server_url: self
                .server_url
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            text_debounce: Duration::from_millis(
                self.text_debounce_ms.unwrap_or(DEFAULT_TEXT_DEBOUNCE_MS),
            ),
            autosave_delay: Duration::from_millis(
                self.autosave_delay_ms.unwrap_or(DEFAULT_AUTOSAVE_DELAY_MS),
            ),
            dependency_match: self.dependency_match.unwrap_or_default(),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            data_dir,
        }
    }
}

impl Settings {
    /// Load the config file, apply environment overrides, then the
    /// command-line catalog path, and fill in defaults
    pub fn load(cli_catalog: Option<PathBuf>) -> Result<Self> {
        let mut config = IntakeConfig::load()?.with_env_overrides();
        if let Some(path) = cli_catalog {
            config.catalog_path = Some(path);
        }
        Ok(config.resolve())
    }
}
