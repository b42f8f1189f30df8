//! JSON-RPC transport for an Ethereum-compatible node

use crate::chain::abi::decode_revert_reason;
use crate::chain::signer::decode_hex;
use crate::constants::api::USER_AGENT;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// `Some(Value::Null)` is a real answer (e.g. a pending receipt); `None` means absent
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    /// Classify a node error: reverts and refusals are rejections
    fn into_error(self) -> Error {
        let revert_data = match &self.data {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Object(o)) => o.get("data").and_then(Value::as_str),
            _ => None,
        };
        if let Some(reason) = revert_data
            .and_then(|d| decode_hex(d).ok())
            .and_then(|bytes| decode_revert_reason(&bytes))
        {
            return Error::ChainRejected(reason);
        }

        if self.message.to_lowercase().contains("revert") || self.code == 3 {
            return Error::ChainRejected(self.message);
        }
        Error::ChainRejected(format!("RPC error {}: {}", self.code, self.message))
    }
}

/// JSON-RPC client with sequential request ids
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Invoke `method` and return its `result`
    ///
    /// Transport failures map to `ChainUnavailable`; error objects returned
    /// by the node map to `ChainRejected`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ChainUnavailable(format!("{} failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(Error::ChainUnavailable(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| Error::ChainUnavailable(format!("Invalid {} response: {}", method, e)))?;

        parse_response(method, response)
    }
}

fn parse_response(method: &str, response: RpcResponse) -> Result<Value> {
    if let Some(error) = response.error {
        return Err(error.into_error());
    }
    response
        .result
        .ok_or_else(|| Error::ChainUnavailable(format!("{} returned no result", method)))
}

/// Parse a hex quantity such as `0x1a`
pub fn parse_quantity(value: &Value) -> Result<u128> {
    let s = value
        .as_str()
        .ok_or_else(|| Error::ChainUnavailable(format!("Expected hex quantity, got {}", value)))?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| Error::ChainUnavailable(format!("Invalid hex quantity: {}", s)))
}

/// Parse hex bytes returned by the node
pub fn parse_bytes(value: &Value) -> Result<Vec<u8>> {
    let s = value
        .as_str()
        .ok_or_else(|| Error::ChainUnavailable(format!("Expected hex data, got {}", value)))?;
    decode_hex(s).map_err(|_| Error::ChainUnavailable(format!("Invalid hex data: {}", s)))
}
