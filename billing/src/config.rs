use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration for the billing node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Users seeded into the ledger at startup, in allocation order.
    /// The last user absorbs emission rounding slack.
    #[serde(default = "default_users")]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Address the JSON-RPC server binds to
    #[serde(default = "default_rpc_host")]
    pub host: String,

    /// Port for the JSON-RPC server
    #[serde(default = "default_rpc_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    pub rating: u64,
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    7201
}

/// Demo user set
fn default_users() -> Vec<UserConfig> {
    [("boris", 5000), ("maria", 1000), ("oleg", 800)]
        .into_iter()
        .map(|(name, rating)| UserConfig {
            name: name.to_string(),
            rating,
        })
        .collect()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: default_rpc_host(),
            port: default_rpc_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            users: default_users(),
        }
    }
}

impl RpcConfig {
    /// Socket address to listen on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid RPC address {}:{}", self.host, self.port))
    }
}

impl Config {
    /// `(name, rating)` pairs for seeding the ledger
    pub fn seed_users(&self) -> impl Iterator<Item = (String, u64)> + '_ {
        self.users.iter().map(|u| (u.name.clone(), u.rating))
    }

    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Check if config file exists
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}

/// Get the default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".billing")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}
