//! Pool configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-2";

/// Credentials and backend parameters a pool is built from
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolConfig {
    /// Backend region
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key id
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key
    #[serde(default)]
    pub secret_access_key: String,
    /// Backend-specific parameters (`endpoint`, `allow_http`, `part_size`, ...)
    #[serde(flatten, default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            extensions: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Test-credential document layout (`{"AccessKey", "SecretAccessKey", "Region"}`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsCredentials {
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub region: String,
}

impl PoolConfig {
    /// Build from a string map. `region`, `access_key_id` and
    /// `secret_access_key` are recognized; every other key is an extension.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in params {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                "region" => config.region = value,
                "access_key_id" => config.access_key_id = value,
                "secret_access_key" => config.secret_access_key = value,
                _ => {
                    config.extensions.insert(key, value);
                }
            }
        }
        config.normalize()
    }

    /// Read the standard `AWS_*` environment variables
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let mut params = Vec::new();
        if let Some(region) = var("AWS_REGION").or_else(|| var("AWS_DEFAULT_REGION")) {
            params.push(("region".to_string(), region));
        }
        if let Some(key) = var("AWS_ACCESS_KEY_ID") {
            params.push(("access_key_id".to_string(), key));
        }
        if let Some(secret) = var("AWS_SECRET_ACCESS_KEY") {
            params.push(("secret_access_key".to_string(), secret));
        }
        if let Some(endpoint) = var("AWS_ENDPOINT_URL") {
            params.push(("endpoint".to_string(), endpoint));
        }
        Self::from_params(params)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PoolConfig = toml::from_str(content)?;
        Ok(config.normalize())
    }

    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `<config dir>/file-siphon/pool.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("file-siphon").join("pool.toml"))
    }

    /// Parse a credentials JSON document
    pub fn from_credentials_json<R: Read>(reader: R) -> Result<Self> {
        let creds: AwsCredentials = serde_json::from_reader(reader)?;
        Ok(Self::from(creds))
    }

    /// Look up a backend-specific parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extensions
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn normalize(mut self) -> Self {
        if self.region.is_empty() {
            self.region = default_region();
        }
        self
    }
}

impl From<AwsCredentials> for PoolConfig {
    fn from(creds: AwsCredentials) -> Self {
        Self::from_params([
            ("region", creds.region),
            ("access_key_id", creds.access_key),
            ("secret_access_key", creds.secret_access_key),
        ])
    }
}
