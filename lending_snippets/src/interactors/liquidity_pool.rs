use multiversx_sc::types::Address;
use std::sync::Arc;

use super::BoundContract;
use crate::{
    abi::{artifact_path, AbiDocument, SmartContract},
    codec::TypedValue,
    constants::{LIQUIDITY_POOL_ABI_NAME, LIQUIDITY_POOL_ABI_PATH},
    errors::Result,
    network::NetworkProvider,
    session::TestSession,
};

/// Binds a liquidity pool interactor to `session`.
///
/// `contract_address` may be `None`; every getter then fails validation until
/// an address is bound.
pub fn create_liquidity_interactor<P: NetworkProvider>(
    session: &mut TestSession<P>,
    contract_address: Option<Address>,
) -> Result<LiquidityPoolInteractor<'_, P>> {
    let abi = AbiDocument::load_for(
        artifact_path(LIQUIDITY_POOL_ABI_PATH),
        LIQUIDITY_POOL_ABI_NAME,
    )?;
    let contract = SmartContract::new(contract_address, Arc::new(abi));
    Ok(LiquidityPoolInteractor {
        bound: BoundContract::bind(session, contract),
    })
}

/// Read-only views of one liquidity pool.
pub struct LiquidityPoolInteractor<'a, P> {
    bound: BoundContract<'a, P>,
}

impl<P: NetworkProvider> LiquidityPoolInteractor<'_, P> {
    pub fn contract(&self) -> &SmartContract {
        self.bound.contract()
    }

    pub async fn get_lend_token(&mut self) -> Result<String> {
        self.query_string("getLendToken").await
    }

    pub async fn get_borrow_token(&mut self) -> Result<String> {
        self.query_string("borrowToken").await
    }

    pub async fn get_pool_asset(&mut self) -> Result<String> {
        self.query_string("getPoolAsset").await
    }

    pub async fn get_pool_params(&mut self) -> Result<String> {
        self.query_string("getPoolParams").await
    }

    pub async fn get_aggregator_address(&mut self) -> Result<String> {
        let address = self.query_string("getAggregatorAddress").await?;
        log::info!("getAggregatorAddress = {address}");
        Ok(address)
    }

    pub async fn get_reserves(&mut self) -> Result<String> {
        let reserves = self.query_string("getReserves").await?;
        log::info!("Reserves are = {reserves}");
        Ok(reserves)
    }

    pub async fn get_liquidation_threshold(&mut self) -> Result<String> {
        self.query_string("getLiquidationThreshold").await
    }

    /// Pool parameters as a decoded struct, for field-level assertions.
    pub async fn pool_params(&mut self) -> Result<TypedValue> {
        self.bound.query_first_value("getPoolParams", Vec::new()).await
    }

    async fn query_string(&mut self, endpoint: &str) -> Result<String> {
        let value = self.bound.query_first_value(endpoint, Vec::new()).await?;
        Ok(value.to_string())
    }
}
