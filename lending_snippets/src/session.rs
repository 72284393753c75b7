use bech32::FromBase32;
use multiversx_sc::types::Address;
use multiversx_sc_snippets::imports::Bech32Address;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use crate::{
    audit::{Audit, AuditKind},
    config::{Config, RiskConfig},
    errors::{Error, Result},
    network::{AccountState, NetworkConfig, NetworkProvider},
};

/// Decodes a bech32 address typed by a user, e.g. on the command line.
pub fn parse_bech32_address(text: &str) -> Result<Address> {
    let invalid = || Error::InvalidAddress(text.to_owned());
    let (_, data, _) = bech32::decode(text).map_err(|_| invalid())?;
    let bytes = Vec::<u8>::from_base32(&data).map_err(|_| invalid())?;
    if bytes.len() != 32 {
        return Err(invalid());
    }
    Ok(Address::from_slice(&bytes))
}

/// A fungible token issued during a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub identifier: String,
    pub name: String,
    pub ticker: String,
    pub decimals: u32,
}

/// Signing principal supplied by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub name: String,
    pub address: Address,
}

impl TestUser {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        TestUser {
            name: name.into(),
            address,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Fixtures {
    #[serde(default)]
    tokens: BTreeMap<String, TokenRecord>,
    #[serde(default)]
    addresses: BTreeMap<String, Bech32Address>,
}

/// Named tokens and addresses shared by the steps of a test run.
///
/// A store opened with [`FixtureStore::load_state`] writes itself back to its
/// file after every save and once more when dropped.
#[derive(Debug, Default)]
pub struct FixtureStore {
    fixtures: Fixtures,
    path: Option<PathBuf>,
}

impl FixtureStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    // Deserializes state from file
    pub fn load_state(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let fixtures = if path.exists() {
            let io_err = |source| Error::Io {
                path: path.clone(),
                source,
            };
            let mut file = std::fs::File::open(&path).map_err(io_err)?;
            let mut content = String::new();
            file.read_to_string(&mut content).map_err(io_err)?;
            toml::from_str(&content).map_err(|source| Error::State {
                path: path.clone(),
                source,
            })?
        } else {
            Fixtures::default()
        };

        Ok(FixtureStore {
            fixtures,
            path: Some(path),
        })
    }

    /// Token records are immutable: a name can be saved once.
    pub fn save_token(&mut self, name: &str, token: TokenRecord) -> Result<()> {
        if self.has_token(name) {
            return Err(Error::FixtureExists(name.to_owned()));
        }
        self.fixtures.tokens.insert(name.to_owned(), token);
        self.persist()
    }

    pub fn has_token(&self, name: &str) -> bool {
        self.fixtures.tokens.contains_key(name)
    }

    pub fn load_token(&self, name: &str) -> Result<TokenRecord> {
        self.fixtures
            .tokens
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingToken(name.to_owned()))
    }

    pub fn save_address(&mut self, name: &str, address: &Address) -> Result<()> {
        self.fixtures
            .addresses
            .insert(name.to_owned(), Bech32Address::from(address.clone()));
        self.persist()
    }

    pub fn load_address(&self, name: &str) -> Result<Address> {
        self.fixtures
            .addresses
            .get(name)
            .map(|address| address.to_address())
            .ok_or_else(|| Error::MissingAddress(name.to_owned()))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // Serializes state to file
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = toml::to_string(&self.fixtures)?;
        let mut file = std::fs::File::create(path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        file.write_all(content.as_bytes())
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })
    }
}

impl Drop for FixtureStore {
    fn drop(&mut self) {
        if let Err(err) = self.persist() {
            log::warn!("fixtures not persisted: {err}");
        }
    }
}

/// Everything a helper needs: fixtures, chain access, configuration and the
/// audit trail.
pub struct TestSession<P> {
    fixtures: FixtureStore,
    provider: P,
    network_config: NetworkConfig,
    audit: Audit,
    risk: RiskConfig,
    accounts: BTreeMap<String, AccountState>,
}

impl<P: NetworkProvider> TestSession<P> {
    pub fn new(provider: P, fixtures: FixtureStore, network_config: NetworkConfig) -> Self {
        TestSession {
            fixtures,
            provider,
            network_config,
            audit: Audit::new(),
            risk: RiskConfig::default(),
            accounts: BTreeMap::new(),
        }
    }

    /// Opens the state file and audit file named by `config`.
    pub fn from_config(provider: P, config: &Config) -> Result<Self> {
        let fixtures = FixtureStore::load_state(&config.state_file)?;
        let network_config = NetworkConfig::new(provider.chain_id(), config.gas);
        let audit = match &config.audit_file {
            Some(path) => Audit::with_file(path)?,
            None => Audit::new(),
        };

        Ok(TestSession {
            fixtures,
            provider,
            network_config,
            audit,
            risk: config.risk,
            accounts: BTreeMap::new(),
        })
    }

    pub fn with_risk(mut self, risk: RiskConfig) -> Self {
        self.risk = risk;
        self
    }

    pub fn save_token(&mut self, name: &str, token: TokenRecord) -> Result<()> {
        self.fixtures.save_token(name, token)
    }

    pub fn load_token(&self, name: &str) -> Result<TokenRecord> {
        self.fixtures.load_token(name)
    }

    pub fn save_address(&mut self, name: &str, address: &Address) -> Result<()> {
        self.fixtures.save_address(name, address)
    }

    pub fn load_address(&self, name: &str) -> Result<Address> {
        self.fixtures.load_address(name)
    }

    /// Refreshes the on-chain view (nonce) of each user.
    pub async fn sync_users(&mut self, users: &[&TestUser]) -> Result<()> {
        for user in users {
            let account = self.provider.sync_account(&user.address).await?;
            log::debug!("synced {} at nonce {}", user.name, account.nonce);
            self.accounts.insert(user.name.clone(), account);
        }
        let names: Vec<&str> = users.iter().map(|user| user.name.as_str()).collect();
        self.audit
            .record(AuditKind::AccountsSynced, names.join(", "));
        Ok(())
    }

    pub fn synced_account(&self, user: &TestUser) -> Option<&AccountState> {
        self.accounts.get(&user.name)
    }

    pub fn network_config(&self) -> &NetworkConfig {
        &self.network_config
    }

    pub fn risk(&self) -> &RiskConfig {
        &self.risk
    }

    pub fn audit(&self) -> &Audit {
        &self.audit
    }

    pub fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub(crate) fn network_parts(&mut self) -> (&mut P, &NetworkConfig, &mut Audit) {
        (&mut self.provider, &self.network_config, &mut self.audit)
    }
}
