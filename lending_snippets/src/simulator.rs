//! In-memory chain running the lending pool router and its liquidity pools.
//!
//! Stands in for a gateway in tests: accounts have nonces and ESDT balances,
//! contract endpoints enforce ownership and the protocol's error messages.
//! Arguments and results go through the SDK codec, as on chain.

use multiversx_sc::types::Address;
use num_bigint::BigUint;
use std::collections::HashMap;

use crate::{
    codec::{decode_scalar, encode_struct, ArgValue, TypedValue},
    constants::*,
    errors::{Error, Result},
    network::*,
    session::TestUser,
};

pub static ERROR_ASSET_NOT_SUPPORTED: &str = "Asset not supported.";
pub static ERROR_ASSET_ALREADY_SUPPORTED: &str = "Asset already supported.";
pub static ERROR_INVALID_TICKER: &str = "Invalid ticker provided.";
pub static ERROR_NO_POOL_FOUND: &str = "No pool found for this asset.";
pub static ERROR_INVALID_LIQUIDATION_THRESHOLD: &str =
    "Invalid liquidation threshold has to be higher than the loan-to-value.";
pub static ERROR_INVALID_AGGREGATOR: &str = "Invalid aggregator.";

// Framework and VM messages, not defined by the contracts.
pub static ERROR_ONLY_OWNER: &str = "Endpoint can only be called by owner";
pub static ERROR_TOKEN_ID_ALREADY_SET: &str = "Token ID already set";
pub static ERROR_MUST_SET_TOKEN_ID: &str = "Must issue or set token ID first";
pub static ERROR_WRONG_ARGUMENTS: &str = "wrong number of arguments";
pub static ERROR_ARGUMENT_DECODE: &str = "argument decode error";
pub static ERROR_INSUFFICIENT_FUNDS: &str = "insufficient funds";
pub static ERROR_EXECUTION_FAILED: &str = "execution failed";

const CHAIN_ID: &str = "localnet";

type Failure = (ReturnCode, &'static str);
type Outcome<T = Vec<Vec<u8>>> = std::result::Result<T, Failure>;

#[derive(Debug, Default)]
struct SimAccount {
    nonce: u64,
    egld: BigUint,
    esdt: HashMap<String, BigUint>,
}

#[derive(Debug)]
struct LendingPoolState {
    owner: Address,
    pools: HashMap<String, Address>,
    loan_to_value: HashMap<String, BigUint>,
    liquidation_bonus: HashMap<String, BigUint>,
}

#[derive(Debug)]
struct LiquidityPoolState {
    owner: Address,
    asset: String,
    params: [BigUint; 5],
    liquidation_threshold: BigUint,
    lend_token: Option<String>,
    borrow_token: Option<String>,
    lend_roles: bool,
    borrow_roles: bool,
    aggregator: Option<Address>,
    reserves: BigUint,
}

#[derive(Debug)]
enum SimContract {
    LendingPool(LendingPoolState),
    LiquidityPool(LiquidityPoolState),
    PriceAggregator,
}

/// Roles granted on the derivative tokens of a liquidity pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolRoles {
    pub lend: bool,
    pub borrow: bool,
}

#[derive(Debug)]
pub struct SimulatedNetwork {
    chain_id: String,
    accounts: HashMap<Address, SimAccount>,
    contracts: HashMap<Address, SimContract>,
    tokens: HashMap<String, u32>,
    address_counter: u64,
    token_counter: u64,
    queries: usize,
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        SimulatedNetwork {
            chain_id: CHAIN_ID.to_owned(),
            accounts: HashMap::new(),
            contracts: HashMap::new(),
            tokens: HashMap::new(),
            address_counter: 0,
            token_counter: 0,
            queries: 0,
        }
    }
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account holding `egld_balance` and returns it as a test user.
    pub fn create_user(&mut self, name: &str, egld_balance: BigUint) -> TestUser {
        let address = self.next_address(false);
        self.accounts.insert(
            address.clone(),
            SimAccount {
                egld: egld_balance,
                ..SimAccount::default()
            },
        );
        TestUser::new(name, address)
    }

    pub fn deploy_lending_pool(&mut self, owner: &TestUser) -> Address {
        let address = self.next_address(true);
        self.contracts.insert(
            address.clone(),
            SimContract::LendingPool(LendingPoolState {
                owner: owner.address.clone(),
                pools: HashMap::new(),
                loan_to_value: HashMap::new(),
                liquidation_bonus: HashMap::new(),
            }),
        );
        self.bump_nonce(&owner.address);
        address
    }

    pub fn deploy_price_aggregator(&mut self, owner: &TestUser) -> Address {
        let address = self.next_address(true);
        self.contracts
            .insert(address.clone(), SimContract::PriceAggregator);
        self.bump_nonce(&owner.address);
        address
    }

    pub fn token_balance(&self, address: &Address, token_identifier: &str) -> BigUint {
        self.accounts
            .get(address)
            .and_then(|account| account.esdt.get(token_identifier))
            .cloned()
            .unwrap_or_default()
    }

    pub fn egld_balance(&self, address: &Address) -> BigUint {
        self.accounts
            .get(address)
            .map(|account| account.egld.clone())
            .unwrap_or_default()
    }

    pub fn nonce(&self, address: &Address) -> u64 {
        self.accounts
            .get(address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries
    }

    /// Overrides the reserves of a liquidity pool, as a supply would.
    pub fn set_reserves(&mut self, pool_address: &Address, reserves: BigUint) -> bool {
        match self.contracts.get_mut(pool_address) {
            Some(SimContract::LiquidityPool(pool)) => {
                pool.reserves = reserves;
                true
            }
            _ => false,
        }
    }

    pub fn pool_roles(&self, pool_address: &Address) -> Option<PoolRoles> {
        match self.contracts.get(pool_address) {
            Some(SimContract::LiquidityPool(pool)) => Some(PoolRoles {
                lend: pool.lend_roles,
                borrow: pool.borrow_roles,
            }),
            _ => None,
        }
    }

    fn next_address(&mut self, is_contract: bool) -> Address {
        self.address_counter += 1;
        let mut bytes = [0u8; 32];
        if !is_contract {
            bytes[..8].copy_from_slice(b"testuser");
        }
        bytes[24..].copy_from_slice(&self.address_counter.to_be_bytes());
        Address::from(bytes)
    }

    fn next_token_identifier(&mut self, ticker: &str) -> String {
        self.token_counter += 1;
        format!("{ticker}-{:06x}", self.token_counter * 0x1f3d)
    }

    fn bump_nonce(&mut self, address: &Address) {
        if let Some(account) = self.accounts.get_mut(address) {
            account.nonce += 1;
        }
    }

    fn execute_query(&self, query: &ContractQuery) -> Outcome {
        let args = &query.arguments;
        match self.contracts.get(&query.address) {
            None => Err((ReturnCode::ContractNotFound, "contract not found")),
            Some(SimContract::LendingPool(state)) => match query.function.as_str() {
                "getPoolAddress" => {
                    let asset = arg_token(args, 0, 1)?;
                    let pool = state
                        .pools
                        .get(&asset)
                        .ok_or((ReturnCode::UserError, ERROR_NO_POOL_FOUND))?;
                    Ok(vec![encode(ArgValue::Address(pool.clone()))?])
                }
                "getAssetLoanToValue" => {
                    let asset = arg_token(args, 0, 1)?;
                    Ok(vec![stored_biguint(state.loan_to_value.get(&asset))?])
                }
                "getAssetLiquidationBonus" => {
                    let asset = arg_token(args, 0, 1)?;
                    Ok(vec![stored_biguint(state.liquidation_bonus.get(&asset))?])
                }
                _ => Err((ReturnCode::FunctionNotFound, "invalid function (not found)")),
            },
            Some(SimContract::LiquidityPool(pool)) => {
                expect_arguments(args, 0)?;
                match query.function.as_str() {
                    "getPoolAsset" => Ok(vec![encode(ArgValue::token(pool.asset.as_str()))?]),
                    "getLendToken" => Ok(vec![stored_token(&pool.lend_token)?]),
                    "borrowToken" => Ok(vec![stored_token(&pool.borrow_token)?]),
                    "getPoolParams" => {
                        let fields = pool
                            .params
                            .iter()
                            .map(|param| ArgValue::BigUint(param.clone()))
                            .collect::<Vec<_>>();
                        let encoded = encode_struct(&fields)
                            .map_err(|_| (ReturnCode::ExecutionFailed, ERROR_EXECUTION_FAILED))?;
                        Ok(vec![encoded])
                    }
                    "getAggregatorAddress" => {
                        let address = pool.aggregator.clone().unwrap_or_else(Address::zero);
                        Ok(vec![encode(ArgValue::Address(address))?])
                    }
                    "getReserves" => Ok(vec![encode(ArgValue::BigUint(pool.reserves.clone()))?]),
                    "getLiquidationThreshold" => Ok(vec![encode(ArgValue::BigUint(
                        pool.liquidation_threshold.clone(),
                    ))?]),
                    _ => Err((ReturnCode::FunctionNotFound, "invalid function (not found)")),
                }
            }
            Some(SimContract::PriceAggregator) => {
                Err((ReturnCode::FunctionNotFound, "invalid function (not found)"))
            }
        }
    }

    fn execute_call(&mut self, call: &ContractCall) -> Outcome {
        let lending_owner = match self.contracts.get(&call.receiver) {
            None => return Err((ReturnCode::ContractNotFound, "contract not found")),
            Some(SimContract::LendingPool(state)) => state.owner.clone(),
            Some(SimContract::LiquidityPool(pool)) => {
                if call.function == "setPriceAggregatorAddress" && call.sender != pool.owner {
                    return Err((ReturnCode::UserError, ERROR_ONLY_OWNER));
                }
                return Err((ReturnCode::FunctionNotFound, "invalid function (not found)"));
            }
            Some(SimContract::PriceAggregator) => {
                return Err((ReturnCode::FunctionNotFound, "invalid function (not found)"))
            }
        };
        if call.sender != lending_owner {
            return Err((ReturnCode::UserError, ERROR_ONLY_OWNER));
        }

        let args = &call.arguments;
        match call.function.as_str() {
            "addLiquidityPool" => {
                let asset = arg_token(args, 0, 7)?;
                if self.lending_pool(&call.receiver).pools.contains_key(&asset) {
                    return Err((ReturnCode::UserError, ERROR_ASSET_ALREADY_SUPPORTED));
                }
                if !is_valid_token_identifier(&asset) {
                    return Err((ReturnCode::UserError, ERROR_INVALID_TICKER));
                }
                let params = [
                    arg_biguint(args, 1)?,
                    arg_biguint(args, 2)?,
                    arg_biguint(args, 3)?,
                    arg_biguint(args, 4)?,
                    arg_biguint(args, 5)?,
                ];
                let liquidation_threshold = arg_biguint(args, 6)?;

                let pool_address = self.next_address(true);
                self.contracts.insert(
                    pool_address.clone(),
                    SimContract::LiquidityPool(LiquidityPoolState {
                        owner: call.receiver.clone(),
                        asset: asset.clone(),
                        params,
                        liquidation_threshold,
                        lend_token: None,
                        borrow_token: None,
                        lend_roles: false,
                        borrow_roles: false,
                        aggregator: None,
                        reserves: BigUint::default(),
                    }),
                );
                self.lending_pool(&call.receiver)
                    .pools
                    .insert(asset, pool_address.clone());
                Ok(vec![encode(ArgValue::Address(pool_address))?])
            }
            "issueLend" | "issueBorrow" => {
                let asset = arg_token(args, 0, 1)?;
                let is_lend = call.function == "issueLend";
                let pool_address = self.pool_of(&call.receiver, &asset)?;

                let already_issued = {
                    let pool = self.liquidity_pool(&pool_address);
                    if is_lend {
                        pool.lend_token.is_some()
                    } else {
                        pool.borrow_token.is_some()
                    }
                };
                if already_issued {
                    return Err((ReturnCode::UserError, ERROR_TOKEN_ID_ALREADY_SET));
                }

                let prefix = if is_lend {
                    LEND_TOKEN_PREFIX
                } else {
                    BORROW_TOKEN_PREFIX
                };
                let ticker = asset.split('-').next().unwrap_or_default();
                let identifier = self.next_token_identifier(&format!("{prefix}{ticker}"));
                let decimals = self.tokens.get(&asset).copied().unwrap_or_default();
                self.tokens.insert(identifier.clone(), decimals);

                let pool = self.liquidity_pool(&pool_address);
                if is_lend {
                    pool.lend_token = Some(identifier);
                } else {
                    pool.borrow_token = Some(identifier);
                }
                Ok(Vec::new())
            }
            "setLendRoles" | "setBorrowRoles" => {
                let asset = arg_token(args, 0, 1)?;
                let pool_address = self.pool_of(&call.receiver, &asset)?;
                let pool = self.liquidity_pool(&pool_address);
                if call.function == "setLendRoles" {
                    if pool.lend_token.is_none() {
                        return Err((ReturnCode::UserError, ERROR_MUST_SET_TOKEN_ID));
                    }
                    pool.lend_roles = true;
                } else {
                    if pool.borrow_token.is_none() {
                        return Err((ReturnCode::UserError, ERROR_MUST_SET_TOKEN_ID));
                    }
                    pool.borrow_roles = true;
                }
                Ok(Vec::new())
            }
            "setAssetLoanToValue" => {
                let asset = arg_token(args, 0, 2)?;
                let loan_to_value = arg_biguint(args, 1)?;
                let pool_address = self.supported_pool(&call.receiver, &asset)?;
                if self.liquidity_pool(&pool_address).liquidation_threshold <= loan_to_value {
                    return Err((ReturnCode::UserError, ERROR_INVALID_LIQUIDATION_THRESHOLD));
                }
                self.lending_pool(&call.receiver)
                    .loan_to_value
                    .insert(asset, loan_to_value);
                Ok(Vec::new())
            }
            "setAssetLiquidationBonus" => {
                let asset = arg_token(args, 0, 2)?;
                let liquidation_bonus = arg_biguint(args, 1)?;
                self.supported_pool(&call.receiver, &asset)?;
                self.lending_pool(&call.receiver)
                    .liquidation_bonus
                    .insert(asset, liquidation_bonus);
                Ok(Vec::new())
            }
            "setAggregator" => {
                let asset = arg_token(args, 0, 2)?;
                let aggregator = arg_address(args, 1)?;
                if aggregator.is_zero() || !self.contracts.contains_key(&aggregator) {
                    return Err((ReturnCode::UserError, ERROR_INVALID_AGGREGATOR));
                }
                let pool_address = self.pool_of(&call.receiver, &asset)?;
                self.liquidity_pool(&pool_address).aggregator = Some(aggregator);
                Ok(Vec::new())
            }
            _ => Err((ReturnCode::FunctionNotFound, "invalid function (not found)")),
        }
    }

    fn pool_of(&mut self, lending: &Address, asset: &str) -> Outcome<Address> {
        self.lending_pool(lending)
            .pools
            .get(asset)
            .cloned()
            .ok_or((ReturnCode::UserError, ERROR_NO_POOL_FOUND))
    }

    fn supported_pool(&mut self, lending: &Address, asset: &str) -> Outcome<Address> {
        self.lending_pool(lending)
            .pools
            .get(asset)
            .cloned()
            .ok_or((ReturnCode::UserError, ERROR_ASSET_NOT_SUPPORTED))
    }

    // Callers have already matched the contract kind.
    fn lending_pool(&mut self, address: &Address) -> &mut LendingPoolState {
        match self.contracts.get_mut(address) {
            Some(SimContract::LendingPool(state)) => state,
            _ => unreachable!("lending pool checked before dispatch"),
        }
    }

    fn liquidity_pool(&mut self, address: &Address) -> &mut LiquidityPoolState {
        match self.contracts.get_mut(address) {
            Some(SimContract::LiquidityPool(pool)) => pool,
            _ => unreachable!("pool addresses come from the router"),
        }
    }

    fn account_mut(&mut self, address: &Address) -> Result<&mut SimAccount> {
        self.accounts
            .get_mut(address)
            .ok_or_else(|| {
                Error::Transport(format!("account {} not found", hex::encode(address.as_bytes())))
            })
    }
}

impl NetworkProvider for SimulatedNetwork {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn query_contract(&mut self, query: &ContractQuery) -> Result<QueryResponse> {
        self.queries += 1;
        Ok(match self.execute_query(query) {
            Ok(return_data) => QueryResponse::ok(return_data),
            Err((code, message)) => QueryResponse::failed(code, message),
        })
    }

    async fn send_call(&mut self, call: &ContractCall) -> Result<TxOutcome> {
        self.account_mut(&call.sender)?.nonce += 1;
        Ok(match self.execute_call(call) {
            Ok(return_data) => TxOutcome::success(return_data),
            Err((code, message)) => TxOutcome::failed(code, message),
        })
    }

    async fn send_transfers(
        &mut self,
        sender: &Address,
        transfers: &[TokenTransfer],
        _gas_limit: u64,
    ) -> Result<TxOutcome> {
        let account = self.account_mut(sender)?;
        account.nonce += transfers.len() as u64;

        let mut required: HashMap<&str, BigUint> = HashMap::new();
        for transfer in transfers {
            *required.entry(transfer.token_identifier.as_str()).or_default() += &transfer.amount;
        }
        let funded = required.iter().all(|(token, amount)| {
            account
                .esdt
                .get(*token)
                .is_some_and(|balance| balance >= amount)
        });
        if !funded {
            return Ok(TxOutcome::failed(ReturnCode::UserError, ERROR_INSUFFICIENT_FUNDS));
        }

        for transfer in transfers {
            if let Some(balance) = self
                .accounts
                .get_mut(sender)
                .and_then(|account| account.esdt.get_mut(&transfer.token_identifier))
            {
                *balance -= &transfer.amount;
            }
            *self
                .accounts
                .entry(transfer.receiver.clone())
                .or_default()
                .esdt
                .entry(transfer.token_identifier.clone())
                .or_default() += &transfer.amount;
        }
        Ok(TxOutcome::success(Vec::new()))
    }

    async fn issue_fungible_token(
        &mut self,
        issuer: &Address,
        spec: &FungibleTokenSpec,
        _gas_limit: u64,
    ) -> Result<String> {
        if !is_valid_ticker(&spec.ticker) {
            return Err(Error::Rejected(format!("{ERROR_INVALID_TICKER} {}", spec.ticker)));
        }

        let issue_cost = BigUint::from(ESDT_ISSUE_COST);
        let account = self.account_mut(issuer)?;
        account.nonce += 1;
        if account.egld < issue_cost {
            return Err(Error::Rejected(ERROR_INSUFFICIENT_FUNDS.to_owned()));
        }
        account.egld -= &issue_cost;

        let identifier = self.next_token_identifier(&spec.ticker);
        self.tokens.insert(identifier.clone(), spec.decimals);
        self.account_mut(issuer)?
            .esdt
            .insert(identifier.clone(), spec.supply.clone());
        Ok(identifier)
    }

    async fn sync_account(&mut self, address: &Address) -> Result<AccountState> {
        let account = self.account_mut(address)?;
        Ok(AccountState {
            address: address.clone(),
            nonce: account.nonce,
        })
    }
}

fn is_valid_ticker(ticker: &str) -> bool {
    (3..=10).contains(&ticker.len())
        && ticker
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// `TICKER-abcdef`: the ticker rules above, a dash, six lowercase hex digits.
fn is_valid_token_identifier(identifier: &str) -> bool {
    match identifier.split_once('-') {
        Some((ticker, random)) => {
            is_valid_ticker(ticker)
                && random.len() == 6
                && random
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, 'a'..='f'))
        }
        None => false,
    }
}

fn expect_arguments(args: &[Vec<u8>], count: usize) -> Outcome<()> {
    if args.len() != count {
        return Err((ReturnCode::UserError, ERROR_WRONG_ARGUMENTS));
    }
    Ok(())
}

fn arg_token(args: &[Vec<u8>], index: usize, count: usize) -> Outcome<String> {
    expect_arguments(args, count)?;
    match decode_arg("TokenIdentifier", args, index)? {
        TypedValue::Token(identifier) => Ok(identifier),
        _ => Err((ReturnCode::UserError, ERROR_ARGUMENT_DECODE)),
    }
}

fn arg_biguint(args: &[Vec<u8>], index: usize) -> Outcome<BigUint> {
    match decode_arg("BigUint", args, index)? {
        TypedValue::BigUint(value) => Ok(value),
        _ => Err((ReturnCode::UserError, ERROR_ARGUMENT_DECODE)),
    }
}

fn arg_address(args: &[Vec<u8>], index: usize) -> Outcome<Address> {
    match decode_arg("Address", args, index)? {
        TypedValue::Address(address) => Ok(address),
        _ => Err((ReturnCode::UserError, ERROR_ARGUMENT_DECODE)),
    }
}

fn decode_arg(abi_type: &str, args: &[Vec<u8>], index: usize) -> Outcome<TypedValue> {
    let bytes = args
        .get(index)
        .ok_or((ReturnCode::UserError, ERROR_WRONG_ARGUMENTS))?;
    decode_scalar(abi_type, bytes).map_err(|_| (ReturnCode::UserError, ERROR_ARGUMENT_DECODE))
}

fn encode(value: ArgValue) -> Outcome<Vec<u8>> {
    value
        .top_encode()
        .map_err(|_| (ReturnCode::ExecutionFailed, ERROR_EXECUTION_FAILED))
}

fn stored_biguint(value: Option<&BigUint>) -> Outcome<Vec<u8>> {
    encode(ArgValue::BigUint(value.cloned().unwrap_or_default()))
}

fn stored_token(token: &Option<String>) -> Outcome<Vec<u8>> {
    encode(ArgValue::token(token.clone().unwrap_or_default()))
}
