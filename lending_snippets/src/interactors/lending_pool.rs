use multiversx_sc::types::Address;
use std::sync::Arc;

use super::BoundContract;
use crate::{
    abi::{artifact_path, AbiDocument, SmartContract},
    codec::{ArgValue, TypedValue},
    constants::{LENDING_POOL_ABI_NAME, LENDING_POOL_ABI_PATH},
    errors::{Error, Result},
    fixed_point::{PoolConfig, Ratio},
    network::{NetworkProvider, ReturnCode},
    session::{TestSession, TestUser},
};

pub fn create_lending_interactor<P: NetworkProvider>(
    session: &mut TestSession<P>,
    contract_address: Option<Address>,
) -> Result<LendingPoolInteractor<'_, P>> {
    let abi = AbiDocument::load_for(artifact_path(LENDING_POOL_ABI_PATH), LENDING_POOL_ABI_NAME)?;
    let contract = SmartContract::new(contract_address, Arc::new(abi));
    Ok(LendingPoolInteractor {
        bound: BoundContract::bind(session, contract),
    })
}

/// Owner-side administration of the lending pool router.
pub struct LendingPoolInteractor<'a, P> {
    bound: BoundContract<'a, P>,
}

impl<P: NetworkProvider> LendingPoolInteractor<'_, P> {
    pub fn contract(&self) -> &SmartContract {
        self.bound.contract()
    }

    /// Deploys a liquidity pool for `asset` with the given rate model.
    pub async fn add_liquidity_pool(
        &mut self,
        owner: &TestUser,
        asset: &str,
        pool: &PoolConfig,
    ) -> Result<ReturnCode> {
        let arguments = vec![
            ArgValue::token(asset),
            ratio_arg(pool.r_base),
            ratio_arg(pool.r_slope1),
            ratio_arg(pool.r_slope2),
            ratio_arg(pool.u_optimal),
            ratio_arg(pool.reserve_factor),
            ratio_arg(pool.liquidation_threshold),
        ];
        self.send(owner, "addLiquidityPool", arguments).await
    }

    pub async fn issue_lend(&mut self, owner: &TestUser, asset: &str) -> Result<ReturnCode> {
        self.send(owner, "issueLend", vec![ArgValue::token(asset)]).await
    }

    pub async fn issue_borrow(&mut self, owner: &TestUser, asset: &str) -> Result<ReturnCode> {
        self.send(owner, "issueBorrow", vec![ArgValue::token(asset)]).await
    }

    pub async fn set_lend_roles(&mut self, owner: &TestUser, asset: &str) -> Result<ReturnCode> {
        self.send(owner, "setLendRoles", vec![ArgValue::token(asset)]).await
    }

    pub async fn set_borrow_roles(&mut self, owner: &TestUser, asset: &str) -> Result<ReturnCode> {
        self.send(owner, "setBorrowRoles", vec![ArgValue::token(asset)]).await
    }

    pub async fn set_asset_loan_to_value(
        &mut self,
        owner: &TestUser,
        asset: &str,
        loan_to_value: Ratio,
    ) -> Result<ReturnCode> {
        let arguments = vec![ArgValue::token(asset), ratio_arg(loan_to_value)];
        self.send(owner, "setAssetLoanToValue", arguments).await
    }

    pub async fn set_asset_liquidation_bonus(
        &mut self,
        owner: &TestUser,
        asset: &str,
        liquidation_bonus: Ratio,
    ) -> Result<ReturnCode> {
        let arguments = vec![ArgValue::token(asset), ratio_arg(liquidation_bonus)];
        self.send(owner, "setAssetLiquidationBonus", arguments).await
    }

    pub async fn set_aggregator(
        &mut self,
        owner: &TestUser,
        asset: &str,
        aggregator: &Address,
    ) -> Result<ReturnCode> {
        let arguments = vec![ArgValue::token(asset), ArgValue::Address(aggregator.clone())];
        self.send(owner, "setAggregator", arguments).await
    }

    pub async fn get_pool_address(&mut self, asset: &str) -> Result<String> {
        self.query_asset_view("getPoolAddress", asset)
            .await
            .map(|value| value.to_string())
    }

    /// Liquidity pool address of `asset`.
    pub async fn pool_address(&mut self, asset: &str) -> Result<Address> {
        match self.query_asset_view("getPoolAddress", asset).await? {
            TypedValue::Address(address) => Ok(address),
            other => Err(Error::decode("Address", format!("unexpected value {other}"))),
        }
    }

    pub async fn get_asset_loan_to_value(&mut self, asset: &str) -> Result<String> {
        self.query_asset_view("getAssetLoanToValue", asset)
            .await
            .map(|value| value.to_string())
    }

    pub async fn get_asset_liquidation_bonus(&mut self, asset: &str) -> Result<String> {
        self.query_asset_view("getAssetLiquidationBonus", asset)
            .await
            .map(|value| value.to_string())
    }

    async fn query_asset_view(&mut self, endpoint: &str, asset: &str) -> Result<TypedValue> {
        self.bound
            .query_first_value(endpoint, vec![ArgValue::token(asset)])
            .await
    }

    async fn send(
        &mut self,
        owner: &TestUser,
        endpoint: &str,
        arguments: Vec<ArgValue>,
    ) -> Result<ReturnCode> {
        let outcome = self.bound.call(owner, endpoint, arguments).await?;
        Ok(outcome.return_code)
    }
}

fn ratio_arg(ratio: Ratio) -> ArgValue {
    ArgValue::BigUint(ratio.to_biguint())
}
