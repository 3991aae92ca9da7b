use crate::core::margin::AllocationPolicy;
use crate::core::row::{RowSchema, SellerSchema};
use crate::core::summary::AccrualRates;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub sheet_id: String,
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: "https://sheets.googleapis.com".to_string(),
            sheet_id: String::new(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DirectoryConfig {
    pub seller_contacts_tab: String,
    pub stockist_contacts_tab: String,
    /// Contact numbers are matched verbatim or with this prefix prepended.
    pub dialing_prefix: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            seller_contacts_tab: "Contact details".to_string(),
            stockist_contacts_tab: "Stockist Contact details".to_string(),
            dialing_prefix: "+91".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SellerConfig {
    /// Tabs that hold seller entries; a seller's rows may span all of them.
    pub tabs: Vec<String>,
    pub schema: SellerSchema,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub directory: DirectoryConfig,
    pub seller: SellerConfig,
    pub ledger_schema: RowSchema,
    pub rates: AccrualRates,
    pub allocation: AllocationPolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "mandi", "mandi")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
