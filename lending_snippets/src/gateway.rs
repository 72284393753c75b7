use multiversx_sc_snippets::{
    imports::*, multiversx_sc_scenario::scenario_model::TxResponseStatus,
};

use crate::{
    config::Config,
    constants::ESDT_ISSUE_COST,
    errors::{Error, Result},
    network::{
        AccountState, ContractCall, ContractQuery, FungibleTokenSpec, NetworkProvider,
        QueryResponse, TokenTransfer, TxOutcome,
    },
    session::TestUser,
};

const TOKEN_PROPERTIES: [&str; 4] = ["canMint", "canBurn", "canUpgrade", "canAddSpecialRoles"];

/// Chain access through a gateway (or chain simulator) via the snippets
/// interactor. Signing happens with the wallets registered on it.
pub struct GatewayProvider {
    interactor: Interactor,
    chain_id: String,
}

impl GatewayProvider {
    pub async fn new(config: &Config) -> Self {
        let mut interactor = Interactor::new(config.gateway_uri())
            .await
            .use_chain_simulator(config.use_chain_simulator());
        interactor.set_current_dir_from_workspace("lending_snippets");
        let chain_id = interactor.network_config.chain_id.clone();

        GatewayProvider {
            interactor,
            chain_id,
        }
    }

    /// Registers `wallet` for signing and returns it as a test user.
    pub async fn register_user(&mut self, name: &str, wallet: Wallet) -> TestUser {
        let address = self.interactor.register_wallet(wallet).await;
        TestUser::new(name, address)
    }
}

fn to_buffers(arguments: &[Vec<u8>]) -> Vec<ManagedBuffer<StaticApi>> {
    arguments
        .iter()
        .map(|argument| ManagedBuffer::new_from_bytes(argument))
        .collect()
}

fn from_buffers(results: ManagedVec<StaticApi, ManagedBuffer<StaticApi>>) -> Vec<Vec<u8>> {
    results
        .iter()
        .map(|buffer| buffer.to_boxed_bytes().as_slice().to_vec())
        .collect()
}

fn to_big_uint(value: &num_bigint::BigUint) -> BigUint<StaticApi> {
    BigUint::from_bytes_be(&value.to_bytes_be())
}

fn failed_outcome(status: TxResponseStatus) -> TxOutcome {
    TxOutcome::failed(status.status.into(), status.message)
}

impl NetworkProvider for GatewayProvider {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn query_contract(&mut self, query: &ContractQuery) -> Result<QueryResponse> {
        let mut request = self
            .interactor
            .query()
            .to(&query.address)
            .raw_call(query.function.as_str());
        for argument in to_buffers(&query.arguments) {
            request = request.argument(&argument);
        }

        let response = request
            .returns(ReturnsHandledOrError::new().returns(ReturnsRawResult))
            .run()
            .await;

        Ok(match response {
            Ok(results) => QueryResponse::ok(from_buffers(results)),
            Err(status) => QueryResponse::failed(status.status.into(), status.message),
        })
    }

    async fn send_call(&mut self, call: &ContractCall) -> Result<TxOutcome> {
        let mut tx = self
            .interactor
            .tx()
            .from(&call.sender)
            .to(&call.receiver)
            .gas(call.gas_limit)
            .raw_call(call.function.as_str());
        for argument in to_buffers(&call.arguments) {
            tx = tx.argument(&argument);
        }

        let response = tx
            .returns(ReturnsHandledOrError::new().returns(ReturnsRawResult))
            .run()
            .await;

        Ok(match response {
            Ok(results) => TxOutcome::success(from_buffers(results)),
            Err(status) => failed_outcome(status),
        })
    }

    async fn send_transfers(
        &mut self,
        sender: &Address,
        transfers: &[TokenTransfer],
        gas_limit: u64,
    ) -> Result<TxOutcome> {
        for transfer in transfers {
            let token = TokenIdentifier::<StaticApi>::from(transfer.token_identifier.as_str());
            let amount = to_big_uint(&transfer.amount);

            let response = self
                .interactor
                .tx()
                .from(sender)
                .to(&transfer.receiver)
                .gas(gas_limit)
                .single_esdt(&token, 0u64, &amount)
                .returns(ReturnsHandledOrError::new().returns(ReturnsRawResult))
                .run()
                .await;

            if let Err(status) = response {
                return Ok(failed_outcome(status));
            }
        }
        Ok(TxOutcome::success(Vec::new()))
    }

    async fn issue_fungible_token(
        &mut self,
        issuer: &Address,
        spec: &FungibleTokenSpec,
        gas_limit: u64,
    ) -> Result<String> {
        let name = ManagedBuffer::<StaticApi>::new_from_bytes(spec.name.as_bytes());
        let ticker = ManagedBuffer::<StaticApi>::new_from_bytes(spec.ticker.as_bytes());
        let supply = to_big_uint(&spec.supply);

        let mut tx = self
            .interactor
            .tx()
            .from(issuer)
            .to(ESDTSystemSCAddress)
            .gas(gas_limit)
            .egld(BigUint::<StaticApi>::from(ESDT_ISSUE_COST))
            .raw_call("issue")
            .argument(&name)
            .argument(&ticker)
            .argument(&supply)
            .argument(&spec.decimals);
        for property in TOKEN_PROPERTIES {
            tx = tx
                .argument(&ManagedBuffer::<StaticApi>::new_from_bytes(property.as_bytes()))
                .argument(&ManagedBuffer::<StaticApi>::new_from_bytes(b"true"));
        }

        let response = tx
            .returns(ReturnsHandledOrError::new().returns(ReturnsNewTokenIdentifier))
            .run()
            .await;

        response.map_err(|status| {
            Error::Rejected(format!("issue {} failed: {}", spec.ticker, status.message))
        })
    }

    async fn sync_account(&mut self, address: &Address) -> Result<AccountState> {
        let nonce = self.interactor.recall_nonce(address).await;
        Ok(AccountState {
            address: address.clone(),
            nonce,
        })
    }
}
