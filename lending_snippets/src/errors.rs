use std::path::PathBuf;

use thiserror::Error;

use crate::network::ReturnCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("token fixture `{0}` not found in session")]
    MissingToken(String),

    #[error("address fixture `{0}` not found in session")]
    MissingAddress(String),

    #[error("token fixture `{0}` is already saved")]
    FixtureExists(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid state file {path}: {source}")]
    State {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize state: {0}")]
    StateEncode(#[from] toml::ser::Error),

    #[error("invalid abi {path}: {source}")]
    Abi {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("abi `{0}` does not match the expected contract `{1}`")]
    AbiMismatch(String, String),

    #[error("interaction `{0}` has no contract address")]
    MissingContractAddress(String),

    #[error("endpoint `{0}` not found in abi")]
    UnknownEndpoint(String),

    #[error("endpoint `{endpoint}` expects {expected} arguments, got {actual}")]
    ArgumentCount {
        endpoint: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument `{input}` of `{endpoint}` has abi type {abi_type}, got {given}")]
    ArgumentType {
        endpoint: String,
        input: String,
        abi_type: String,
        given: &'static str,
    },

    #[error("endpoint `{0}` is not readonly and cannot be queried")]
    NotReadonly(String),

    #[error("query `{endpoint}` failed with {code}: {message}")]
    QueryFailed {
        endpoint: String,
        code: ReturnCode,
        message: String,
    },

    #[error("query `{0}` returned no value")]
    MissingFirstValue(String),

    #[error("cannot encode {kind}: {reason}")]
    Encode { kind: String, reason: String },

    #[error("cannot decode {abi_type}: {reason}")]
    Decode { abi_type: String, reason: String },

    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl Error {
    pub fn decode(abi_type: &str, reason: impl Into<String>) -> Self {
        Error::Decode {
            abi_type: abi_type.to_string(),
            reason: reason.into(),
        }
    }
}
