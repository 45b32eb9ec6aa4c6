//! JSON-RPC request envelope

use crate::{field::json_type_name, Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Protocol tag written into the `jsonrpc` member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RpcVersion {
    #[default]
    #[serde(rename = "1.0")]
    V1,
    #[serde(rename = "2.0")]
    V2,
}

impl RpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcVersion::V1 => "1.0",
            RpcVersion::V2 => "2.0",
        }
    }
}

impl fmt::Display for RpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request or notification envelope with strictly positional params
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, deserialize_with = "params_or_null")]
    pub params: Vec<Value>,
    #[serde(default)]
    pub id: Value,
}

/// `"params": null` carries no params, same as leaving the member out
fn params_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error> {
    Option::<Vec<Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Request ids may be null, a number or a string.
pub fn is_valid_id(id: &Value) -> bool {
    matches!(id, Value::Null | Value::Number(_) | Value::String(_))
}

impl Request {
    pub fn new(version: RpcVersion, id: Value, method: impl Into<String>, params: Vec<Value>) -> Result<Self> {
        if !is_valid_id(&id) {
            return Err(Error::invalid_type(format!(
                "the id of type {} is invalid",
                json_type_name(&id)
            )));
        }
        Ok(Self {
            jsonrpc: version.as_str().to_string(),
            method: method.into(),
            params,
            id,
        })
    }

    /// Parse a request from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let request: Request = serde_json::from_slice(bytes)
            .map_err(|e| Error::invalid_type(format!("malformed request: {}", e)).with_source(e))?;
        if !is_valid_id(&request.id) {
            return Err(Error::invalid_type(format!(
                "the id of type {} is invalid",
                json_type_name(&request.id)
            )));
        }
        Ok(request)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::invalid_type("cannot encode request").with_source(e))
    }
}
