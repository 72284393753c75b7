use core::fmt;

use multiversx_sc::{
    codec::{
        top_encode_to_vec_u8, DecodeError, EncodeError, NestedDecode, NestedEncode, TopDecode,
    },
    types::{
        Address, BigUint as ManagedBigUint, EgldOrEsdtTokenIdentifier, ManagedBuffer,
        TokenIdentifier,
    },
};
use multiversx_sc_meta_lib::abi_json::{EndpointAbiJson, TypeDescriptionJson};
use multiversx_sc_snippets::imports::{Bech32Address, StaticApi};
use num_bigint::BigUint;

use crate::{
    abi::AbiDocument,
    errors::{Error, Result},
    network::{QueryResponse, ReturnCode},
};

/// An endpoint argument before top-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Token(String),
    BigUint(BigUint),
    U64(u64),
    Bool(bool),
    Address(Address),
    Bytes(Vec<u8>),
}

impl ArgValue {
    pub fn token(identifier: impl Into<String>) -> Self {
        ArgValue::Token(identifier.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ArgValue::Token(_) => "token identifier",
            ArgValue::BigUint(_) => "BigUint",
            ArgValue::U64(_) => "u64",
            ArgValue::Bool(_) => "bool",
            ArgValue::Address(_) => "Address",
            ArgValue::Bytes(_) => "bytes",
        }
    }

    /// Whether this value can be passed where the ABI declares `abi_type`.
    pub fn fits(&self, abi_type: &str) -> bool {
        match self {
            ArgValue::Token(_) => matches!(
                abi_type,
                "TokenIdentifier" | "EgldOrEsdtTokenIdentifier" | "TokenId"
            ),
            ArgValue::BigUint(_) => abi_type == "BigUint",
            ArgValue::U64(value) => match abi_type {
                "u64" | "BigUint" => true,
                "u32" => *value <= u32::MAX as u64,
                "u16" => *value <= u16::MAX as u64,
                "u8" => *value <= u8::MAX as u64,
                _ => false,
            },
            ArgValue::Bool(_) => abi_type == "bool",
            ArgValue::Address(_) => abi_type == "Address",
            ArgValue::Bytes(_) => matches!(abi_type, "bytes" | "ManagedBuffer" | "List<u8>"),
        }
    }

    pub fn top_encode(&self) -> Result<Vec<u8>> {
        let encoded = match self {
            ArgValue::Token(identifier) => top_encode_to_vec_u8(&managed_token(identifier)),
            ArgValue::BigUint(value) => top_encode_to_vec_u8(&managed_biguint(value)),
            ArgValue::U64(value) => top_encode_to_vec_u8(value),
            ArgValue::Bool(value) => top_encode_to_vec_u8(value),
            ArgValue::Address(address) => top_encode_to_vec_u8(address),
            ArgValue::Bytes(bytes) => top_encode_to_vec_u8(bytes),
        };
        encoded.map_err(|err| encode_error(self.kind(), err))
    }

    /// Appends the nested encoding, as used for struct fields.
    pub fn nested_encode(&self, dest: &mut Vec<u8>) -> Result<()> {
        let encoded = match self {
            ArgValue::Token(identifier) => managed_token(identifier).dep_encode(dest),
            ArgValue::BigUint(value) => managed_biguint(value).dep_encode(dest),
            ArgValue::U64(value) => value.dep_encode(dest),
            ArgValue::Bool(value) => value.dep_encode(dest),
            ArgValue::Address(address) => address.dep_encode(dest),
            ArgValue::Bytes(bytes) => bytes.dep_encode(dest),
        };
        encoded.map_err(|err| encode_error(self.kind(), err))
    }
}

/// Top-encodes a struct value from its fields, in declaration order.
pub fn encode_struct(fields: &[ArgValue]) -> Result<Vec<u8>> {
    let mut encoded = Vec::new();
    for field in fields {
        field.nested_encode(&mut encoded)?;
    }
    Ok(encoded)
}

fn managed_token(identifier: &str) -> TokenIdentifier<StaticApi> {
    TokenIdentifier::from(identifier)
}

fn managed_biguint(value: &BigUint) -> ManagedBigUint<StaticApi> {
    ManagedBigUint::from_bytes_be(&value.to_bytes_be())
}

fn encode_error(kind: &str, err: EncodeError) -> Error {
    Error::Encode {
        kind: kind.to_owned(),
        reason: String::from_utf8_lossy(err.message_bytes()).into_owned(),
    }
}

/// A value decoded according to its ABI type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Token(String),
    BigUint(BigUint),
    U64(u64),
    Bool(bool),
    Address(Address),
    Bytes(Vec<u8>),
    Struct {
        name: String,
        fields: Vec<(String, TypedValue)>,
    },
}

impl TypedValue {
    pub fn field(&self, name: &str) -> Option<&TypedValue> {
        match self {
            TypedValue::Struct { fields, .. } => fields
                .iter()
                .find(|(field_name, _)| field_name == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Token(identifier) => f.write_str(identifier),
            TypedValue::BigUint(value) => write!(f, "{value}"),
            TypedValue::U64(value) => write!(f, "{value}"),
            TypedValue::Bool(value) => write!(f, "{value}"),
            TypedValue::Address(address) => {
                f.write_str(Bech32Address::from(address.clone()).to_bech32_str())
            }
            TypedValue::Bytes(bytes) => f.write_str(&hex::encode(bytes)),
            TypedValue::Struct { name, fields } => {
                write!(f, "{name} {{ ")?;
                for (index, (field_name, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field_name}: {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Decoded return values of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedOutcome {
    pub return_code: ReturnCode,
    pub values: Vec<TypedValue>,
}

impl TypedOutcome {
    pub fn first_value(&self) -> Option<&TypedValue> {
        self.values.first()
    }
}

/// Decodes `response` against the outputs declared by `endpoint`.
pub fn parse_query_response(
    response: &QueryResponse,
    endpoint: &EndpointAbiJson,
    abi: &AbiDocument,
) -> Result<TypedOutcome> {
    if !response.return_code.is_success() {
        return Err(Error::QueryFailed {
            endpoint: endpoint.name.clone(),
            code: response.return_code,
            message: response.return_message.clone(),
        });
    }

    let values = endpoint
        .outputs
        .iter()
        .zip(response.return_data.iter())
        .map(|(output, data)| decode_top(&output.type_name, data, abi))
        .collect::<Result<Vec<_>>>()?;

    Ok(TypedOutcome {
        return_code: response.return_code,
        values,
    })
}

/// Top-decodes `data` as `abi_type`; struct types are looked up in `abi`.
pub fn decode_top(abi_type: &str, data: &[u8], abi: &AbiDocument) -> Result<TypedValue> {
    decode_value(abi_type, &mut Input::Top(data), Some(abi))
}

/// Top-decodes a value of a framework type, no struct descriptions needed.
pub fn decode_scalar(abi_type: &str, data: &[u8]) -> Result<TypedValue> {
    decode_value(abi_type, &mut Input::Top(data), None)
}

enum Input<'a, 'b> {
    Top(&'a [u8]),
    Nested(&'b mut &'a [u8]),
}

impl Input<'_, '_> {
    fn read<T: TopDecode + NestedDecode>(&mut self, abi_type: &str) -> Result<T> {
        let decoded = match self {
            Input::Top(data) => T::top_decode(*data),
            Input::Nested(input) => T::dep_decode(&mut **input),
        };
        decoded.map_err(|err| decode_error(abi_type, err))
    }
}

fn decode_value(
    abi_type: &str,
    input: &mut Input<'_, '_>,
    abi: Option<&AbiDocument>,
) -> Result<TypedValue> {
    match abi_type {
        "TokenIdentifier" | "TokenId" => {
            let token: TokenIdentifier<StaticApi> = input.read(abi_type)?;
            token_value(abi_type, token.into_managed_buffer())
        }
        "EgldOrEsdtTokenIdentifier" => {
            let token: EgldOrEsdtTokenIdentifier<StaticApi> = input.read(abi_type)?;
            token_value(abi_type, token.into_name())
        }
        "BigUint" => {
            let value: ManagedBigUint<StaticApi> = input.read(abi_type)?;
            Ok(TypedValue::BigUint(BigUint::from_bytes_be(
                value.to_bytes_be().as_slice(),
            )))
        }
        "u8" => input.read::<u8>(abi_type).map(|value| TypedValue::U64(value.into())),
        "u16" => input.read::<u16>(abi_type).map(|value| TypedValue::U64(value.into())),
        "u32" => input.read::<u32>(abi_type).map(|value| TypedValue::U64(value.into())),
        "u64" => input.read::<u64>(abi_type).map(TypedValue::U64),
        "bool" => input.read::<bool>(abi_type).map(TypedValue::Bool),
        "Address" => input.read::<Address>(abi_type).map(TypedValue::Address),
        "bytes" | "ManagedBuffer" | "List<u8>" => {
            input.read::<Vec<u8>>(abi_type).map(TypedValue::Bytes)
        }
        custom => {
            let description = abi
                .and_then(|abi| abi.type_description(custom))
                .ok_or_else(|| Error::decode(custom, "type not described in abi"))?;
            decode_struct(custom, description, input, abi)
        }
    }
}

fn decode_struct(
    name: &str,
    description: &TypeDescriptionJson,
    input: &mut Input<'_, '_>,
    abi: Option<&AbiDocument>,
) -> Result<TypedValue> {
    if description.content_type != "struct" {
        return Err(Error::decode(
            name,
            format!("unsupported kind {}", description.content_type),
        ));
    }

    let fields = match input {
        Input::Top(data) => {
            let mut rest = *data;
            let fields = decode_fields(description, &mut rest, abi)?;
            if !rest.is_empty() {
                return Err(Error::decode(name, "input too long"));
            }
            fields
        }
        Input::Nested(rest) => decode_fields(description, rest, abi)?,
    };
    Ok(TypedValue::Struct {
        name: name.to_owned(),
        fields,
    })
}

fn decode_fields(
    description: &TypeDescriptionJson,
    rest: &mut &[u8],
    abi: Option<&AbiDocument>,
) -> Result<Vec<(String, TypedValue)>> {
    description
        .fields
        .iter()
        .map(|field| {
            decode_value(&field.field_type, &mut Input::Nested(&mut *rest), abi)
                .map(|value| (field.name.clone(), value))
        })
        .collect()
}

fn token_value(abi_type: &str, buffer: ManagedBuffer<StaticApi>) -> Result<TypedValue> {
    String::from_utf8(buffer.to_boxed_bytes().into_vec())
        .map(TypedValue::Token)
        .map_err(|_| Error::decode(abi_type, "identifier is not utf-8"))
}

fn decode_error(abi_type: &str, err: DecodeError) -> Error {
    Error::decode(abi_type, String::from_utf8_lossy(err.message_bytes()))
}
