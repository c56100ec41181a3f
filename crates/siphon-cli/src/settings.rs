//! Pool configuration resolution for the CLI

use anyhow::{Context, Result};
use clap::Args;
use siphon_core::PoolConfig;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Pool configuration file (TOML)
    #[arg(long, global = true, env = "SIPHON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Credentials JSON file ({"AccessKey", "SecretAccessKey", "Region"})
    #[arg(long, global = true, conflicts_with = "config")]
    pub credentials: Option<PathBuf>,

    /// Override the configured region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// S3-compatible endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

impl ConfigArgs {
    /// `--config`, then `--credentials`, then the default config file if it
    /// exists, then the environment; flags override whatever was loaded
    pub fn resolve(&self) -> Result<PoolConfig> {
        let mut config = if let Some(path) = &self.config {
            load_file(path)?
        } else if let Some(path) = &self.credentials {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            PoolConfig::from_credentials_json(file)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            match PoolConfig::default_path().filter(|p| p.exists()) {
                Some(path) => load_file(&path)?,
                None => {
                    debug!("No configuration file, reading the environment");
                    PoolConfig::from_env()
                }
            }
        };

        // Empty flags leave the loaded values alone
        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            config.region = region.to_string();
        }
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            config
                .extensions
                .insert("endpoint".to_string(), endpoint.to_string());
            if endpoint.starts_with("http://") {
                config
                    .extensions
                    .insert("allow_http".to_string(), "true".to_string());
            }
        }
        Ok(config)
    }
}

pub fn load_file(path: &Path) -> Result<PoolConfig> {
    debug!("Loading configuration from {}", path.display());
    PoolConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_with_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pool.toml");
        fs::write(&path, "region = \"eu-west-1\"\naccess_key_id = \"AKID\"\n").unwrap();

        let args = ConfigArgs {
            config: Some(path),
            endpoint: Some("http://localhost:9000".to_string()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.access_key_id, "AKID");
        assert_eq!(config.get("endpoint"), Some("http://localhost:9000"));
        assert_eq!(config.get("allow_http"), Some("true"));
    }

    #[test]
    fn test_credentials_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("awsCreds.json");
        fs::write(
            &path,
            r#"{"AccessKey": "A", "SecretAccessKey": "S", "Region": "us-west-2"}"#,
        )
        .unwrap();

        let args = ConfigArgs {
            credentials: Some(path),
            region: Some("ap-south-1".to_string()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.access_key_id, "A");
        assert_eq!(config.region, "ap-south-1");
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pool.toml");
        fs::write(&path, "access_key_id = \"AKID\"\n").unwrap();

        let args = ConfigArgs {
            config: Some(path),
            region: Some(String::new()),
            endpoint: Some(String::new()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.region, siphon_core::DEFAULT_REGION);
        assert_eq!(config.get("endpoint"), None);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/pool.toml")),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
