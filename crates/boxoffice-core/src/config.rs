//! Configuration system for Box Office.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $BOXOFFICE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/boxoffice/config.toml
//!   3. ~/.config/boxoffice/config.toml
//!
//! The loaded value is read-only for the lifetime of the process. The daemon
//! wraps it in an `Arc` and hands it to every ledger session.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxOfficeConfig {
    pub identity: IdentityConfig,
    pub ledger: LedgerConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Credential store directory. Created on first use.
    pub wallet_path: PathBuf,
    /// Enrolled user every session acts as.
    pub user_id: String,
    /// Membership service provider the user is enrolled with.
    pub msp_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub channel_id: String,
    pub chaincode_id: String,
    /// Endorsing peer endpoint.
    pub peer: String,
    /// Peer event hub endpoint used for commit notifications.
    pub events: String,
    /// Ordering service endpoint.
    pub orderer: String,
    /// How long to wait for a commit event after ordering.
    pub commit_timeout_ms: u64,
    /// Which proposal responses must be successful.
    pub endorsement: EndorsementPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
    pub port: u16,
}

/// Proposal acceptance rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndorsementPolicy {
    /// Only the first responder is inspected.
    #[default]
    First,
    /// Every attached peer must answer with a signed 200.
    All,
}

impl std::str::FromStr for EndorsementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "all" => Ok(Self::All),
            other => Err(format!("unknown endorsement policy: {other}")),
        }
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            wallet_path: data_dir().join("hfc-key-store"),
            user_id: "admin".to_string(),
            msp_id: "Org1MSP".to_string(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            channel_id: "mychannel".to_string(),
            chaincode_id: "apollo".to_string(),
            peer: "grpc://localhost:7051".to_string(),
            events: "grpc://localhost:7053".to_string(),
            orderer: "grpc://localhost:7050".to_string(),
            commit_timeout_ms: 30_000,
            endorsement: EndorsementPolicy::First,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl LedgerConfig {
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("boxoffice")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("boxoffice")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl BoxOfficeConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::file_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load a config file without env overrides. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(BoxOfficeConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("BOXOFFICE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        Self::write_default_to(&path)?;
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        let text = toml::to_string_pretty(&BoxOfficeConfig::default())
            .map_err(ConfigError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))
    }

    /// Apply BOXOFFICE_* env var overrides. `PORT` is honoured for the API port.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("BOXOFFICE_IDENTITY__WALLET_PATH") {
            self.identity.wallet_path = PathBuf::from(v);
        }
        if let Some(v) = var("BOXOFFICE_IDENTITY__USER_ID") {
            self.identity.user_id = v;
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__CHANNEL_ID") {
            self.ledger.channel_id = v;
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__CHAINCODE_ID") {
            self.ledger.chaincode_id = v;
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__PEER") {
            self.ledger.peer = v;
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__EVENTS") {
            self.ledger.events = v;
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__ORDERER") {
            self.ledger.orderer = v;
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__COMMIT_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.ledger.commit_timeout_ms = ms;
            }
        }
        if let Some(v) = var("BOXOFFICE_LEDGER__ENDORSEMENT") {
            if let Ok(policy) = v.parse() {
                self.ledger.endorsement = policy;
            }
        }
        if let Some(v) = var("BOXOFFICE_API__BIND") {
            self.api.bind = v;
        }
        if let Some(v) = var("PORT").or_else(|| var("BOXOFFICE_API__PORT")) {
            if let Ok(p) = v.parse() {
                self.api.port = p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_matches_network_layout() {
        let config = BoxOfficeConfig::default();
        assert_eq!(config.identity.user_id, "admin");
        assert_eq!(config.ledger.channel_id, "mychannel");
        assert_eq!(config.ledger.chaincode_id, "apollo");
        assert_eq!(config.ledger.peer, "grpc://localhost:7051");
        assert_eq!(config.ledger.events, "grpc://localhost:7053");
        assert_eq!(config.ledger.orderer, "grpc://localhost:7050");
        assert_eq!(config.ledger.commit_timeout(), Duration::from_secs(30));
        assert_eq!(config.ledger.endorsement, EndorsementPolicy::First);
        assert_eq!(config.api.port, 8000);
    }

    #[test]
    fn overrides_replace_fields() {
        let vars: HashMap<&str, &str> = [
            ("BOXOFFICE_LEDGER__CHANNEL_ID", "boxchannel"),
            ("BOXOFFICE_LEDGER__COMMIT_TIMEOUT_MS", "5"),
            ("BOXOFFICE_LEDGER__ENDORSEMENT", "all"),
            ("PORT", "9100"),
        ]
        .into_iter()
        .collect();

        let mut config = BoxOfficeConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.ledger.channel_id, "boxchannel");
        assert_eq!(config.ledger.commit_timeout_ms, 5);
        assert_eq!(config.ledger.endorsement, EndorsementPolicy::All);
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.ledger.chaincode_id, "apollo");
    }

    #[test]
    fn unparsable_overrides_are_ignored() {
        let mut config = BoxOfficeConfig::default();
        config.apply_overrides(|k| match k {
            "BOXOFFICE_LEDGER__COMMIT_TIMEOUT_MS" => Some("soon".to_string()),
            "BOXOFFICE_LEDGER__ENDORSEMENT" => Some("most".to_string()),
            _ => None,
        });
        assert_eq!(config.ledger.commit_timeout_ms, 30_000);
        assert_eq!(config.ledger.endorsement, EndorsementPolicy::First);
    }

    #[test]
    fn write_default_then_load_roundtrips() {
        let tmp = std::env::temp_dir().join(format!("boxoffice-config-test-{}", std::process::id()));
        let path = tmp.join("nested").join("config.toml");

        BoxOfficeConfig::write_default_to(&path).unwrap();
        assert!(path.exists());

        let config = BoxOfficeConfig::load_from(&path).unwrap();
        assert_eq!(config.ledger.chaincode_id, "apollo");
        assert_eq!(config.identity.msp_id, "Org1MSP");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = std::env::temp_dir().join(format!("boxoffice-partial-test-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("config.toml");
        std::fs::write(&path, "[ledger]\ncommit_timeout_ms = 2000\nendorsement = \"all\"\n").unwrap();

        let config = BoxOfficeConfig::load_from(&path).unwrap();
        assert_eq!(config.ledger.commit_timeout_ms, 2000);
        assert_eq!(config.ledger.endorsement, EndorsementPolicy::All);
        assert_eq!(config.ledger.channel_id, "mychannel");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
