pub mod lending_pool;
pub mod liquidity_pool;

pub use lending_pool::*;
pub use liquidity_pool::*;

use crate::{
    abi::SmartContract,
    audit::{Audit, AuditKind},
    codec::{parse_query_response, ArgValue, TypedValue},
    errors::{Error, Result},
    network::{NetworkConfig, NetworkProvider, TxOutcome},
    session::{TestSession, TestUser},
};

/// A contract bound to the network access of one session.
///
/// Borrows the session for the duration of one logical operation.
pub struct BoundContract<'a, P> {
    contract: SmartContract,
    network_provider: &'a mut P,
    network_config: &'a NetworkConfig,
    audit: &'a mut Audit,
}

impl<'a, P: NetworkProvider> BoundContract<'a, P> {
    pub fn bind(session: &'a mut TestSession<P>, contract: SmartContract) -> Self {
        let (network_provider, network_config, audit) = session.network_parts();
        BoundContract {
            contract,
            network_provider,
            network_config,
            audit,
        }
    }

    pub fn contract(&self) -> &SmartContract {
        &self.contract
    }

    pub fn network_config(&self) -> &NetworkConfig {
        self.network_config
    }

    /// Runs one query and decodes the first returned value.
    pub async fn query_first_value(
        &mut self,
        endpoint: &str,
        arguments: Vec<ArgValue>,
    ) -> Result<TypedValue> {
        let interaction = self.contract.method(endpoint, arguments).check()?;
        let query = interaction.build_query()?;

        self.audit.record(AuditKind::QuerySent, endpoint);
        let response = self.network_provider.query_contract(&query).await?;

        let outcome = parse_query_response(&response, interaction.endpoint(), self.contract.abi())?;
        let first_value = outcome
            .first_value()
            .cloned()
            .ok_or_else(|| Error::MissingFirstValue(endpoint.to_owned()))?;

        log::debug!("{endpoint} = {first_value}");
        Ok(first_value)
    }

    /// Sends one contract call signed by `sender` and waits for its outcome.
    pub async fn call(
        &mut self,
        sender: &TestUser,
        endpoint: &str,
        arguments: Vec<ArgValue>,
    ) -> Result<TxOutcome> {
        let interaction = self.contract.method(endpoint, arguments).check()?;
        let call = interaction.build_call(&sender.address, self.network_config.gas.call)?;

        self.audit.record(
            AuditKind::TransactionSent,
            format!("{} -> {endpoint}", sender.name),
        );
        let outcome = self.network_provider.send_call(&call).await?;
        self.audit.record(
            AuditKind::TransactionCompleted,
            format!("{endpoint}: {}", outcome.return_code),
        );

        if !outcome.is_success() {
            log::warn!(
                "{endpoint} failed with {}: {}",
                outcome.return_code,
                outcome.return_message
            );
        }
        Ok(outcome)
    }
}
