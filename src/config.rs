//! Service configuration
//!
//! Loaded from the environment (after `.env`), with an optional TOML file for
//! toolchain executable names.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::languages::Toolchain;

/// Default per-step wall-clock budget
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 10;

/// Everything the executor needs, injectable for tests
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Budget applied independently to every compile and run step
    pub step_timeout: Duration,
    /// Parent directory for workspaces (system temp dir if `None`)
    pub workspace_root: Option<PathBuf>,
    pub toolchain: Toolchain,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(DEFAULT_STEP_TIMEOUT_SECS),
            workspace_root: None,
            toolchain: Toolchain::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub executor: ExecutorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {}", port))?,
            None => 8000,
        };

        let timeout_secs = match lookup("EXECUTION_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .with_context(|| format!("Invalid EXECUTION_TIMEOUT_SECS: {}", secs))?,
            None => DEFAULT_STEP_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("EXECUTION_TIMEOUT_SECS must be greater than zero");
        }

        let workspace_root = lookup("WORKSPACE_ROOT")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let toolchain = match lookup("TOOLCHAIN_CONFIG").filter(|s| !s.is_empty()) {
            Some(path) => Toolchain::from_file(&path)?,
            None => Toolchain::default(),
        };

        Ok(Self {
            host,
            port,
            executor: ExecutorConfig {
                step_timeout: Duration::from_secs(timeout_secs),
                workspace_root,
                toolchain,
            },
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.executor.step_timeout, Duration::from_secs(10));
        assert_eq!(config.executor.workspace_root, None);
        assert_eq!(config.executor.toolchain, Toolchain::default());
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain_path = dir.path().join("toolchain.toml");
        std::fs::write(&toolchain_path, "javac = \"/opt/jdk/bin/javac\"\n").unwrap();
        let toolchain_path = toolchain_path.to_string_lossy().into_owned();

        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9100"),
            ("EXECUTION_TIMEOUT_SECS", "3"),
            ("WORKSPACE_ROOT", "/var/tmp/runner"),
            ("TOOLCHAIN_CONFIG", toolchain_path.as_str()),
        ])
        .unwrap();

        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9100");
        assert_eq!(config.executor.step_timeout, Duration::from_secs(3));
        assert_eq!(
            config.executor.workspace_root,
            Some(PathBuf::from("/var/tmp/runner"))
        );
        assert_eq!(config.executor.toolchain.javac, "/opt/jdk/bin/javac");
        assert_eq!(config.executor.toolchain.java, "java");
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("EXECUTION_TIMEOUT_SECS", "-1")]).is_err());
        assert!(load(&[("EXECUTION_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("TOOLCHAIN_CONFIG", "/nonexistent/toolchain.toml")]).is_err());
    }
}
