use core::fmt;

use multiversx_sc::{
    chain_core::types::ReturnCode as VmReturnCode,
    types::Address,
};
use num_bigint::BigUint;

use crate::{config::GasConfig, errors::Result};

/// Outcome class of a contract call or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Ok,
    UserError,
    FunctionNotFound,
    ContractNotFound,
    OutOfGas,
    ExecutionFailed,
}

impl ReturnCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ReturnCode::Ok)
    }
}

/// Folds the VM status carried by a failed transaction or query.
impl From<VmReturnCode> for ReturnCode {
    fn from(code: VmReturnCode) -> Self {
        match code {
            VmReturnCode::Success => ReturnCode::Ok,
            VmReturnCode::UserError => ReturnCode::UserError,
            VmReturnCode::FunctionNotFound | VmReturnCode::FunctionWrongSignature => {
                ReturnCode::FunctionNotFound
            }
            VmReturnCode::ContractNotFound | VmReturnCode::ContractInvalid => {
                ReturnCode::ContractNotFound
            }
            VmReturnCode::OutOfGas => ReturnCode::OutOfGas,
            VmReturnCode::AccountCollision
            | VmReturnCode::OutOfFunds
            | VmReturnCode::CallStackOverFlow
            | VmReturnCode::ExecutionFailed
            | VmReturnCode::UpgradeFailed
            | VmReturnCode::SimulateFailed => ReturnCode::ExecutionFailed,
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReturnCode::Ok => "ok",
            ReturnCode::UserError => "user error",
            ReturnCode::FunctionNotFound => "function not found",
            ReturnCode::ContractNotFound => "contract not found",
            ReturnCode::OutOfGas => "out of gas",
            ReturnCode::ExecutionFailed => "execution failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractQuery {
    pub address: Address,
    pub function: String,
    pub arguments: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub return_code: ReturnCode,
    pub return_message: String,
    pub return_data: Vec<Vec<u8>>,
}

impl QueryResponse {
    pub fn ok(return_data: Vec<Vec<u8>>) -> Self {
        QueryResponse {
            return_code: ReturnCode::Ok,
            return_message: String::new(),
            return_data,
        }
    }

    pub fn failed(return_code: ReturnCode, message: impl Into<String>) -> Self {
        QueryResponse {
            return_code,
            return_message: message.into(),
            return_data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub sender: Address,
    pub receiver: Address,
    pub function: String,
    pub arguments: Vec<Vec<u8>>,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub return_code: ReturnCode,
    pub return_message: String,
    pub return_data: Vec<Vec<u8>>,
}

impl TxOutcome {
    pub fn success(return_data: Vec<Vec<u8>>) -> Self {
        TxOutcome {
            return_code: ReturnCode::Ok,
            return_message: String::new(),
            return_data,
        }
    }

    pub fn failed(return_code: ReturnCode, message: impl Into<String>) -> Self {
        TxOutcome {
            return_code,
            return_message: message.into(),
            return_data: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.return_code.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub receiver: Address,
    pub token_identifier: String,
    pub amount: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FungibleTokenSpec {
    pub name: String,
    pub ticker: String,
    pub decimals: u32,
    pub supply: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub address: Address,
    pub nonce: u64,
}

/// Chain parameters shared by every interaction of a session.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub chain_id: String,
    pub gas: GasConfig,
}

impl NetworkConfig {
    pub fn new(chain_id: impl Into<String>, gas: GasConfig) -> Self {
        NetworkConfig {
            chain_id: chain_id.into(),
            gas,
        }
    }
}

/// Access to a chain: queries, signed transactions and account state.
///
/// Signing, encoding of the transaction envelope and transport are the
/// implementor's business; arguments arrive already top-encoded.
#[allow(async_fn_in_trait)]
pub trait NetworkProvider {
    fn chain_id(&self) -> &str;

    async fn query_contract(&mut self, query: &ContractQuery) -> Result<QueryResponse>;

    async fn send_call(&mut self, call: &ContractCall) -> Result<TxOutcome>;

    /// Sends every transfer from `sender` as one batch.
    async fn send_transfers(
        &mut self,
        sender: &Address,
        transfers: &[TokenTransfer],
        gas_limit: u64,
    ) -> Result<TxOutcome>;

    /// Issues a fungible ESDT and returns its identifier.
    async fn issue_fungible_token(
        &mut self,
        issuer: &Address,
        spec: &FungibleTokenSpec,
        gas_limit: u64,
    ) -> Result<String>;

    async fn sync_account(&mut self, address: &Address) -> Result<AccountState>;
}
