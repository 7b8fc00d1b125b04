//! Server configuration.
//!
//! Layers, lowest precedence first: built-in defaults, an optional YAML file,
//! environment variables (`LISTEN`, `SERVE_ROOT`, `SERVE_LISTDIR`), then
//! whatever the binary applies from its command line. The result is validated
//! once at startup and never changes afterwards.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served as `/`
    pub root: PathBuf,
    /// Render an index for directories without an index file
    pub list_directories: bool,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            list_directories: false,
        }
    }
}

impl Config {
    /// The YAML file (or defaults when there is none), overlaid with the
    /// environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid configuration")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Ok(root) = std::env::var("SERVE_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
        if let Ok(flag) = std::env::var("SERVE_LISTDIR") {
            self.static_files.list_directories = parse_flag(&flag);
        }
    }

    /// Replaces the port of the listen address, keeping its host.
    pub fn set_port(&mut self, port: u16) -> anyhow::Result<()> {
        if port == 0 {
            bail!("invalid port number: {port}");
        }
        let host = self
            .server
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or("0.0.0.0");
        self.server.listen_addr = format!("{host}:{port}");
        Ok(())
    }

    /// Resolves the root to an absolute directory; fails if it is not one.
    pub fn validate(mut self) -> anyhow::Result<Self> {
        let root = &self.static_files.root;
        let canonical = root
            .canonicalize()
            .with_context(|| format!("unable to open root {}", root.display()))?;
        if !canonical.is_dir() {
            bail!("root {} is not a directory", canonical.display());
        }
        self.static_files.root = canonical;
        Ok(self)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
