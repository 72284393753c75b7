use core::fmt;

use multiversx_sc::types::Address;
use multiversx_sc_meta_lib::abi_json::{
    ContractAbiJson, EndpointAbiJson, EndpointMutabilityAbiJson, TypeDescriptionJson,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    codec::ArgValue,
    errors::{Error, Result},
    network::{ContractCall, ContractQuery},
};

/// The `*.abi.json` document produced by the contract build.
pub struct AbiDocument {
    contract: ContractAbiJson,
}

impl AbiDocument {
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let contract = serde_json::from_str(content).map_err(|source| Error::Abi {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(AbiDocument { contract })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Loads the document and checks that it describes `contract_name`.
    pub fn load_for(path: impl AsRef<Path>, contract_name: &str) -> Result<Self> {
        let abi = Self::load(path)?;
        if abi.name() != contract_name {
            return Err(Error::AbiMismatch(
                abi.name().to_owned(),
                contract_name.to_owned(),
            ));
        }
        Ok(abi)
    }

    pub fn name(&self) -> &str {
        &self.contract.name
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointAbiJson> {
        self.contract
            .endpoints
            .iter()
            .find(|endpoint| endpoint.name == name)
    }

    pub fn type_description(&self, name: &str) -> Option<&TypeDescriptionJson> {
        self.contract.types.get(name)
    }

    fn endpoint_index(&self, name: &str) -> Option<usize> {
        self.contract
            .endpoints
            .iter()
            .position(|endpoint| endpoint.name == name)
    }
}

impl fmt::Debug for AbiDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbiDocument")
            .field("name", &self.contract.name)
            .field("endpoints", &self.contract.endpoints.len())
            .finish()
    }
}

pub fn is_readonly(endpoint: &EndpointAbiJson) -> bool {
    matches!(endpoint.mutability, EndpointMutabilityAbiJson::Readonly)
}

/// Resolves an artifact path relative to this crate.
pub fn artifact_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// A contract address, possibly unknown yet, paired with its ABI.
#[derive(Debug, Clone)]
pub struct SmartContract {
    address: Option<Address>,
    abi: Arc<AbiDocument>,
}

impl SmartContract {
    pub fn new(address: Option<Address>, abi: Arc<AbiDocument>) -> Self {
        SmartContract { address, abi }
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn abi(&self) -> &AbiDocument {
        &self.abi
    }

    pub fn method(&self, endpoint: &str, arguments: Vec<ArgValue>) -> Interaction {
        Interaction {
            contract: self.clone(),
            endpoint: endpoint.to_owned(),
            arguments,
        }
    }
}

/// A pending call or query, not yet validated against the ABI.
#[derive(Debug, Clone)]
pub struct Interaction {
    contract: SmartContract,
    endpoint: String,
    arguments: Vec<ArgValue>,
}

impl Interaction {
    /// Validates address, endpoint name and arguments against the ABI.
    pub fn check(self) -> Result<CheckedInteraction> {
        let abi = self.contract.abi.clone();
        let endpoint_index = abi
            .endpoint_index(&self.endpoint)
            .ok_or_else(|| Error::UnknownEndpoint(self.endpoint.clone()))?;
        let endpoint = &abi.contract.endpoints[endpoint_index];

        let address = self
            .contract
            .address
            .clone()
            .ok_or_else(|| Error::MissingContractAddress(self.endpoint.clone()))?;

        if endpoint.inputs.len() != self.arguments.len() {
            return Err(Error::ArgumentCount {
                endpoint: endpoint.name.clone(),
                expected: endpoint.inputs.len(),
                actual: self.arguments.len(),
            });
        }

        for (input, argument) in endpoint.inputs.iter().zip(self.arguments.iter()) {
            if !argument.fits(&input.type_name) {
                return Err(Error::ArgumentType {
                    endpoint: endpoint.name.clone(),
                    input: input.arg_name.clone(),
                    abi_type: input.type_name.clone(),
                    given: argument.kind(),
                });
            }
        }

        Ok(CheckedInteraction {
            address,
            abi,
            endpoint_index,
            arguments: self.arguments,
        })
    }
}

/// An interaction known to match the ABI.
#[derive(Debug, Clone)]
pub struct CheckedInteraction {
    address: Address,
    abi: Arc<AbiDocument>,
    endpoint_index: usize,
    arguments: Vec<ArgValue>,
}

impl CheckedInteraction {
    pub fn endpoint(&self) -> &EndpointAbiJson {
        &self.abi.contract.endpoints[self.endpoint_index]
    }

    pub fn build_query(&self) -> Result<ContractQuery> {
        let endpoint = self.endpoint();
        if !is_readonly(endpoint) {
            return Err(Error::NotReadonly(endpoint.name.clone()));
        }
        Ok(ContractQuery {
            address: self.address.clone(),
            function: endpoint.name.clone(),
            arguments: self.encoded_arguments()?,
        })
    }

    pub fn build_call(&self, sender: &Address, gas_limit: u64) -> Result<ContractCall> {
        Ok(ContractCall {
            sender: sender.clone(),
            receiver: self.address.clone(),
            function: self.endpoint().name.clone(),
            arguments: self.encoded_arguments()?,
            gas_limit,
        })
    }

    fn encoded_arguments(&self) -> Result<Vec<Vec<u8>>> {
        self.arguments.iter().map(ArgValue::top_encode).collect()
    }
}
