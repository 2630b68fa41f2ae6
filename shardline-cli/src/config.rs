//! CLI configuration loading

use anyhow::{Context, Result};
use shardline_types::ProxyConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_DIR: &str = ".shardline";
const DEFAULT_FILE: &str = "shardline.toml";

/// Where the proxy configuration lives
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
}

impl Config {
    /// Use `path`, or `~/.shardline/shardline.toml` when none is given
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => dirs::home_dir()
                .context("cannot determine home directory; pass --config")?
                .join(DEFAULT_DIR)
                .join(DEFAULT_FILE),
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, parse and validate the proxy configuration
    pub fn load(&self) -> Result<ProxyConfig> {
        debug!(path = %self.path.display(), "Loading configuration");

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse(&text).with_context(|| format!("invalid configuration in {}", self.path.display()))
    }
}

fn parse(text: &str) -> Result<ProxyConfig> {
    let config: ProxyConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}
