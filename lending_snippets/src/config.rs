use serde::Deserialize;
use std::{
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    constants::*,
    errors::{Error, Result},
    fixed_point::{PoolConfig, Ratio},
};

/// Config file
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Real,
    Simulator,
}

/// Gas limits attached to the transactions sent by the helpers.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    pub call: u64,
    pub issue: u64,
    pub transfer: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        GasConfig {
            call: DEFAULT_CALL_GAS_LIMIT,
            issue: DEFAULT_ISSUE_GAS_LIMIT,
            transfer: DEFAULT_TRANSFER_GAS_LIMIT,
        }
    }
}

/// Risk parameters applied by the market helpers.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub pool: PoolConfig,
    pub loan_to_value: Ratio,
    pub liquidation_bonus: Ratio,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            pool: PoolConfig::default(),
            loan_to_value: Ratio::from_raw_units(DEFAULT_LOAN_TO_VALUE),
            liquidation_bonus: Ratio::from_raw_units(DEFAULT_LIQUIDATION_BONUS),
        }
    }
}

/// Contract Interact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway_uri: String,
    pub chain_type: ChainType,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default)]
    pub audit_file: Option<PathBuf>,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub risk: RiskConfig,
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Config::chain_simulator_config()
    }
}

impl Config {
    /// Deserializes config from file
    pub fn new() -> Result<Self> {
        Self::load(CONFIG_FILE)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn chain_simulator_config() -> Self {
        Config {
            gateway_uri: DEFAULT_GATEWAY_URI.to_owned(),
            chain_type: ChainType::Simulator,
            state_file: default_state_file(),
            audit_file: None,
            gas: GasConfig::default(),
            risk: RiskConfig::default(),
        }
    }

    // Returns the gateway URI
    pub fn gateway_uri(&self) -> &str {
        &self.gateway_uri
    }

    // Returns if chain type is chain simulator
    pub fn use_chain_simulator(&self) -> bool {
        match self.chain_type {
            ChainType::Real => false,
            ChainType::Simulator => true,
        }
    }
}
