// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Wallet Configuration Types
//
// Kubernetes-style manifest for one wallet instance:
// - Wallet identity
// - Credential trust anchor (pinned issuer, last-known schema)
// - Secure bridge origin allow-list and release ceiling
// - Local storage backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::classification::ClassificationLevel;
use crate::domain::repository::validate_wallet_id;

pub const API_VERSION: &str = "100monkeys.ai/mls-wallet/v1";
pub const KIND: &str = "WalletConfig";

/// The single issuer whose classification credentials the wallet trusts.
pub const TRUSTED_ISSUER_DID: &str = "did:web:clearance.100monkeys.ai";

/// Last schema version the wallet was built against. Drift is logged, not rejected.
pub const KNOWN_CLEARANCE_SCHEMA: &str = "https://schemas.100monkeys.ai/clearance/v2.json";

/// Top-level wallet configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfigManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: WalletConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfigSpec {
    /// Stable wallet identifier; namespaces every persisted record.
    pub wallet_id: String,

    #[serde(default)]
    pub trust: TrustConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    #[serde(default = "default_trusted_issuer")]
    pub trusted_issuer: String,

    #[serde(default = "default_known_schema")]
    pub known_schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Origins whose messages are processed. Everything else is dropped silently.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// This wallet window's own origin; messages from it are ignored.
    #[serde(default = "default_self_origin")]
    pub self_origin: String,

    /// Window that opened the wallet and receives `WALLET_READY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opener_origin: Option<String>,

    /// Highest classification the bridge may release, on top of the clearance
    /// each request must resolve from held credentials.
    #[serde(default = "default_max_level")]
    pub max_level: ClassificationLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackendKind,

    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_trusted_issuer() -> String {
    TRUSTED_ISSUER_DID.to_string()
}

fn default_known_schema() -> String {
    KNOWN_CLEARANCE_SCHEMA.to_string()
}

fn default_self_origin() -> String {
    "https://wallet.100monkeys.ai".to_string()
}

fn default_max_level() -> ClassificationLevel {
    ClassificationLevel::Unclassified
}

fn default_storage_backend() -> StorageBackendKind {
    StorageBackendKind::Sled
}

fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".mls-wallet").join("store"))
        .unwrap_or_else(|| PathBuf::from("./.mls-wallet/store"))
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trusted_issuer: default_trusted_issuer(),
            known_schema: default_known_schema(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            self_origin: default_self_origin(),
            opener_origin: None,
            max_level: default_max_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

impl Default for WalletConfigSpec {
    fn default() -> Self {
        Self {
            wallet_id: "default".to_string(),
            trust: TrustConfig::default(),
            bridge: BridgeConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for WalletConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "mls-wallet".to_string(),
                version: None,
            },
            spec: WalletConfigSpec::default(),
        }
    }
}

impl WalletConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. MLS_WALLET_CONFIG_PATH environment variable
    /// 2. ./mls-wallet.yaml (working directory)
    /// 3. ~/.mls-wallet/config.yaml (user home)
    /// 4. /etc/mls-wallet/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MLS_WALLET_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./mls-wallet.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mls-wallet").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/mls-wallet/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MLS_WALLET_ID") {
            if !val.trim().is_empty() {
                tracing::info!("Environment override: MLS_WALLET_ID={}", val);
                self.spec.wallet_id = val.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("MLS_WALLET_ALLOWED_ORIGINS") {
            let origins: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            tracing::info!("Environment override: MLS_WALLET_ALLOWED_ORIGINS ({} origins)", origins.len());
            self.spec.bridge.allowed_origins = origins;
        }

        if let Ok(val) = std::env::var("MLS_WALLET_STORAGE_PATH") {
            tracing::info!("Environment override: MLS_WALLET_STORAGE_PATH={}", val);
            self.spec.storage.path = PathBuf::from(val);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.wallet_id.trim().is_empty() {
            anyhow::bail!("spec.wallet_id cannot be empty");
        }
        validate_wallet_id(&self.spec.wallet_id).map_err(|e| anyhow::anyhow!("spec.wallet_id: {}", e))?;

        if self.spec.trust.trusted_issuer.trim().is_empty() {
            anyhow::bail!("spec.trust.trusted_issuer cannot be empty");
        }

        let bridge = &self.spec.bridge;
        if bridge.allowed_origins.iter().any(|o| o == &bridge.self_origin) {
            anyhow::bail!(
                "spec.bridge.allowed_origins must not contain the wallet's own origin '{}'",
                bridge.self_origin
            );
        }

        if let Some(opener) = &bridge.opener_origin {
            if !bridge.allowed_origins.contains(opener) {
                anyhow::bail!("spec.bridge.opener_origin '{}' is not in allowed_origins", opener);
            }
        }

        Ok(())
    }
}
