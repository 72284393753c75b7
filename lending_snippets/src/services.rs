use num_bigint::BigUint;

use crate::{
    audit::AuditKind,
    errors::{Error, Result},
    fixed_point::token_amount,
    network::{FungibleTokenSpec, NetworkProvider, TokenTransfer},
    session::{TestSession, TestUser, TokenRecord},
};

/// A fungible payment in the smallest denomination of its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayment {
    pub token_identifier: String,
    pub amount: BigUint,
}

impl TokenPayment {
    /// `units` whole tokens of a token with `decimals` decimals.
    pub fn fungible_from_amount(token_identifier: &str, units: u64, decimals: u32) -> Self {
        TokenPayment {
            token_identifier: token_identifier.to_owned(),
            amount: token_amount(units, decimals),
        }
    }
}

/// Issues test tokens.
pub struct EsdtInteractor<'a, P> {
    session: &'a mut TestSession<P>,
}

pub fn create_esdt_interactor<P: NetworkProvider>(
    session: &mut TestSession<P>,
) -> EsdtInteractor<'_, P> {
    EsdtInteractor { session }
}

impl<P: NetworkProvider> EsdtInteractor<'_, P> {
    pub async fn issue_fungible_token(
        &mut self,
        issuer: &TestUser,
        spec: &FungibleTokenSpec,
    ) -> Result<TokenRecord> {
        let gas_limit = self.session.network_config().gas.issue;
        let (provider, _, audit) = self.session.network_parts();

        let identifier = provider
            .issue_fungible_token(&issuer.address, spec, gas_limit)
            .await?;
        audit.record(
            AuditKind::TokenIssued,
            format!("{} issued {identifier}", issuer.name),
        );

        Ok(TokenRecord {
            identifier,
            name: spec.name.clone(),
            ticker: spec.ticker.clone(),
            decimals: spec.decimals,
        })
    }
}

/// Distributes payments from one funded account.
pub struct AirdropService<'a, P> {
    session: &'a mut TestSession<P>,
}

pub fn create_airdrop_service<P: NetworkProvider>(
    session: &mut TestSession<P>,
) -> AirdropService<'_, P> {
    AirdropService { session }
}

impl<P: NetworkProvider> AirdropService<'_, P> {
    /// Sends every payment to every recipient in a single batch.
    pub async fn send_to_each_user(
        &mut self,
        sender: &TestUser,
        recipients: &[&TestUser],
        payments: &[TokenPayment],
    ) -> Result<()> {
        let transfers: Vec<TokenTransfer> = recipients
            .iter()
            .flat_map(|recipient| {
                payments.iter().map(move |payment| TokenTransfer {
                    receiver: recipient.address.clone(),
                    token_identifier: payment.token_identifier.clone(),
                    amount: payment.amount.clone(),
                })
            })
            .collect();

        let gas_limit = self.session.network_config().gas.transfer;
        let (provider, _, audit) = self.session.network_parts();

        let outcome = provider
            .send_transfers(&sender.address, &transfers, gas_limit)
            .await?;
        if !outcome.is_success() {
            return Err(Error::Rejected(format!(
                "airdrop from {} failed with {}: {}",
                sender.name, outcome.return_code, outcome.return_message
            )));
        }

        audit.record(
            AuditKind::Airdrop,
            format!(
                "{} sent {} transfers to {} users",
                sender.name,
                transfers.len(),
                recipients.len()
            ),
        );
        Ok(())
    }
}
