//! Configuration Management
//!
//! Persistent user defaults for oci-inventory, and the per-run settings
//! handed to the region driver.

use crate::error::FailurePolicy;
use crate::resource::ResourceKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Region used for identity calls when nothing else is configured
pub const DEFAULT_REGION: &str = "us-ashburn-1";

/// User configuration stored in `<config_dir>/oci-inventory/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Home region used to reach the identity service
    #[serde(default)]
    pub region: Option<String>,
    /// File holding the security token used to authorize requests
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// Session private key that signs requests
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// Directory the CSV report is written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Property schema override
    #[serde(default)]
    pub properties_file: Option<PathBuf>,
    #[serde(default)]
    pub recursive: Option<bool>,
    #[serde(default)]
    pub home_region_only: Option<bool>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("oci-inventory").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective region (OCI_REGION > config > default)
    pub fn effective_region(&self) -> String {
        non_empty_env("OCI_REGION")
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective token file (OCI_SECURITY_TOKEN_FILE > config)
    pub fn effective_token_file(&self) -> Option<PathBuf> {
        non_empty_env("OCI_SECURITY_TOKEN_FILE")
            .map(PathBuf::from)
            .or_else(|| self.token_file.clone())
    }

    /// Get effective session key (OCI_SESSION_KEY_FILE > config)
    pub fn effective_key_file(&self) -> Option<PathBuf> {
        non_empty_env("OCI_SESSION_KEY_FILE")
            .map(PathBuf::from)
            .or_else(|| self.key_file.clone())
    }

    /// Single base URL for every service, if overridden (OCI_ENDPOINT)
    pub fn endpoint_override(&self) -> Option<String> {
        non_empty_env("OCI_ENDPOINT")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Settings for one collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Aggregation root; the tenancy when unset
    pub root_compartment_id: Option<String>,
    /// Descend into sub-compartments
    pub recursive: bool,
    /// Only collect the home region
    pub home_region_only: bool,
    /// Kinds to collect
    pub kinds: Vec<ResourceKind>,
    /// Handling of compartment listing failures
    pub compartment_failures: FailurePolicy,
    /// Handling of instance/volume/availability-domain listing failures
    pub inventory_failures: FailurePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root_compartment_id: None,
            recursive: true,
            home_region_only: false,
            kinds: ResourceKind::ALL.to_vec(),
            compartment_failures: FailurePolicy::BestEffort,
            inventory_failures: FailurePolicy::Abort,
        }
    }
}

impl RunConfig {
    pub fn collects(&self, kind: ResourceKind) -> bool {
        self.kinds.contains(&kind)
    }
}
