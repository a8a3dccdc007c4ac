//! Optional TOML settings file for the `task-graph` binary.
//!
//! Every key is optional; command-line flags take precedence over the file.
//!
//! ```toml
//! access_token = "~/.config/task-graph/github_access_token"
//! api_base = "https://api.github.com"
//! timeout_secs = 30
//! max_in_flight = 10
//! direction = "LR"
//! skip_closed = true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub access_token: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_in_flight: Option<usize>,
    pub direction: Option<String>,
    pub skip_closed: Option<bool>,
}

impl FileConfig {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("Invalid task-graph config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("In config file: {}", path.display()))
    }
}
