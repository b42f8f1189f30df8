//! TripRegistry client over JSON-RPC
//!
//! Writes are signed locally and sent with `eth_sendRawTransaction`. Nonce
//! lookup, signing and submission run under one lock so concurrent writes from
//! this process never reuse a nonce.

use crate::chain::abi;
use crate::chain::events::{event_topic, first_trip_created, LogEntry};
use crate::chain::rpc::{parse_bytes, parse_quantity, RpcClient};
use crate::chain::signer::{parse_address, LegacyTransaction, Wallet};
use crate::chain::{ChainTrip, CreatedTrip, LedgerClient};
use crate::config::ChainSettings;
use crate::constants::contract::GAS_MARGIN_PERCENT;
use crate::error::{Error, Result};
use crate::trip::TripStatus;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    transaction_hash: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    logs: Vec<LogEntry>,
}

impl Receipt {
    fn succeeded(&self) -> bool {
        // Pre-Byzantium receipts have no status field
        self.status.as_deref().map_or(true, |s| s != "0x0")
    }
}

/// Live TripRegistry client
#[derive(Debug)]
pub struct RpcLedger {
    rpc: RpcClient,
    wallet: Wallet,
    contract: [u8; 20],
    contract_hex: String,
    chain_id: u64,
    update_status_signature: String,
    trip_created_topic: String,
    submit_lock: Mutex<()>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    /// Parse settings and confirm the node is reachable
    pub async fn connect(settings: &ChainSettings) -> Result<Self> {
        let wallet = Wallet::from_hex(&settings.private_key)?;
        let contract = parse_address(&settings.contract_address)?;
        let rpc = RpcClient::new(&settings.rpc_url)?;

        let chain_id = parse_quantity(&rpc.call("eth_chainId", json!([])).await?)?;
        let chain_id = u64::try_from(chain_id)
            .map_err(|_| Error::ChainUnavailable(format!("Chain id {} out of range", chain_id)))?;

        info!(
            rpc = rpc.url(),
            chain_id,
            sender = %wallet.address_hex(),
            contract = %settings.contract_address,
            update_status = %settings.update_status_signature,
            trip_created = %settings.trip_created_event,
            "connected to trip registry"
        );

        Ok(Self {
            rpc,
            wallet,
            contract,
            contract_hex: format!("0x{}", hex::encode(contract)),
            chain_id,
            update_status_signature: settings.update_status_signature.clone(),
            trip_created_topic: event_topic(&settings.trip_created_event),
            submit_lock: Mutex::new(()),
            confirmation_timeout: settings.confirmation_timeout,
            poll_interval: settings.poll_interval,
        })
    }

    fn call_object(&self, data: &[u8]) -> Value {
        json!({
            "from": self.wallet.address_hex(),
            "to": self.contract_hex,
            "data": format!("0x{}", hex::encode(data)),
        })
    }

    /// Read-only contract call
    async fn eth_call(&self, data: &[u8]) -> Result<Vec<u8>> {
        let result = self
            .rpc
            .call("eth_call", json!([self.call_object(data), "latest"]))
            .await?;
        parse_bytes(&result)
    }

    /// Sign and submit a contract write, returning the transaction hash
    async fn send(&self, data: Vec<u8>) -> Result<String> {
        let _guard = self.submit_lock.lock().await;

        let sender = self.wallet.address_hex();
        let nonce = self
            .rpc
            .call("eth_getTransactionCount", json!([sender, "pending"]))
            .await?;
        let gas_price = self.rpc.call("eth_gasPrice", json!([])).await?;
        // Estimation runs the call, so reverts surface here before anything is signed
        let estimate = self
            .rpc
            .call("eth_estimateGas", json!([self.call_object(&data)]))
            .await?;

        let estimate = to_u64(parse_quantity(&estimate)?)?;
        let tx = LegacyTransaction {
            nonce: to_u64(parse_quantity(&nonce)?)?,
            gas_price: parse_quantity(&gas_price)?,
            gas_limit: estimate + estimate * GAS_MARGIN_PERCENT / 100,
            to: self.contract,
            value: 0,
            data,
        };
        let raw = self.wallet.sign(&tx, self.chain_id)?;

        let hash = self
            .rpc
            .call(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        let hash = hash
            .as_str()
            .ok_or_else(|| Error::ChainUnavailable("Transaction hash is not a string".to_string()))?
            .to_string();

        debug!(%hash, nonce = tx.nonce, gas = tx.gas_limit, "transaction submitted");
        Ok(hash)
    }

    /// Poll for the receipt until it appears or the confirmation timeout passes
    async fn wait_for_receipt(&self, hash: &str) -> Result<Receipt> {
        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            let result = self
                .rpc
                .call("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if !result.is_null() {
                let receipt: Receipt = serde_json::from_value(result).map_err(|e| {
                    Error::ChainUnavailable(format!("Invalid receipt for {}: {}", hash, e))
                })?;
                if !receipt.succeeded() {
                    return Err(Error::ChainRejected(format!(
                        "Transaction {} reverted",
                        hash
                    )));
                }
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                warn!(%hash, timeout = ?self.confirmation_timeout, "confirmation timed out");
                return Err(Error::ChainUnavailable(format!(
                    "Transaction {} not confirmed within {:?}",
                    hash, self.confirmation_timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }
}

fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::ChainUnavailable(format!("Value {} out of range", value)))
}

#[async_trait]
impl LedgerClient for RpcLedger {
    fn contract_address(&self) -> String {
        self.contract_hex.clone()
    }

    async fn create_trip(&self, meta: &str) -> Result<CreatedTrip> {
        let hash = self.send(abi::encode_create_trip(meta)).await?;
        let receipt = self.wait_for_receipt(&hash).await?;
        let on_chain_trip_id = first_trip_created(&receipt.logs, &self.contract_hex, &self.trip_created_topic);

        info!(hash = %receipt.transaction_hash, ?on_chain_trip_id, "trip created on chain");
        Ok(CreatedTrip {
            transaction_hash: receipt.transaction_hash,
            on_chain_trip_id,
        })
    }

    async fn update_status(&self, trip_id: u64, status: TripStatus) -> Result<String> {
        let hash = self
            .send(abi::encode_update_status(
                &self.update_status_signature,
                trip_id,
                status.ordinal(),
            ))
            .await?;
        let receipt = self.wait_for_receipt(&hash).await?;

        info!(hash = %receipt.transaction_hash, trip_id, %status, "trip status updated on chain");
        Ok(receipt.transaction_hash)
    }

    async fn get_trip(&self, trip_id: u64) -> Result<ChainTrip> {
        let data = self.eth_call(&abi::encode_get_trip(trip_id)).await?;
        let raw = abi::decode_trip(&data)?;
        ChainTrip::from_raw(raw)
    }

    async fn total_trips(&self) -> Result<u64> {
        let data = self.eth_call(&abi::encode_total_trips()).await?;
        abi::decode_total_trips(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::signer::decode_hex;
    use crate::config::ChainConfig;
    use crate::constants::contract::TRIP_CREATED_EVENT;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex as StdMutex};

    const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[derive(Clone, Copy)]
    enum ReceiptMode {
        Mined,
        Reverted,
        Pending,
    }

    /// Minimal JSON-RPC node: hands out nonces, records submissions and
    /// answers receipt polls according to `mode`
    struct MockNode {
        mode: ReceiptMode,
        trip_id: u64,
        next_nonce: StdMutex<u64>,
        submitted_nonces: StdMutex<Vec<u64>>,
        methods: StdMutex<Vec<String>>,
    }

    impl MockNode {
        fn new(mode: ReceiptMode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                trip_id: 7,
                next_nonce: StdMutex::new(0),
                submitted_nonces: StdMutex::new(Vec::new()),
                methods: StdMutex::new(Vec::new()),
            })
        }

        fn respond(&self, method: &str, params: &Value) -> Value {
            match method {
                "eth_chainId" => json!("0x7a69"),
                "eth_getTransactionCount" => {
                    json!(format!("0x{:x}", *self.next_nonce.lock().unwrap()))
                }
                "eth_gasPrice" => json!("0x3b9aca00"),
                "eth_estimateGas" => json!("0x186a0"),
                "eth_sendRawTransaction" => {
                    let raw = decode_hex(params[0].as_str().unwrap()).unwrap();
                    let nonce = raw_nonce(&raw);
                    self.submitted_nonces.lock().unwrap().push(nonce);
                    let mut next = self.next_nonce.lock().unwrap();
                    *next = nonce + 1;
                    json!(format!("0x{:064x}", nonce + 1))
                }
                "eth_getTransactionReceipt" => {
                    let hash = params[0].clone();
                    match self.mode {
                        ReceiptMode::Pending => Value::Null,
                        ReceiptMode::Reverted => json!({
                            "transactionHash": hash,
                            "status": "0x0",
                            "logs": []
                        }),
                        ReceiptMode::Mined => json!({
                            "transactionHash": hash,
                            "status": "0x1",
                            "logs": [{
                                "address": CONTRACT,
                                "topics": [
                                    event_topic(TRIP_CREATED_EVENT),
                                    format!("0x{:064x}", self.trip_id)
                                ],
                                "data": "0x"
                            }]
                        }),
                    }
                }
                other => panic!("unexpected method {}", other),
            }
        }

        fn submissions(&self) -> Vec<String> {
            self.methods
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.as_str() != "eth_getTransactionReceipt")
                .cloned()
                .collect()
        }
    }

    /// Nonce of a signed legacy transaction: the first item of its RLP list
    fn raw_nonce(raw: &[u8]) -> u64 {
        let header = if raw[0] <= 0xf7 {
            1
        } else {
            1 + (raw[0] - 0xf7) as usize
        };
        match raw[header] {
            0x80 => 0,
            b if b < 0x80 => b as u64,
            b => {
                let len = (b - 0x80) as usize;
                raw[header + 1..header + 1 + len]
                    .iter()
                    .fold(0u64, |n, byte| (n << 8) | *byte as u64)
            }
        }
    }

    async fn rpc(State(node): State<Arc<MockNode>>, Json(req): Json<Value>) -> Json<Value> {
        let method = req["method"].as_str().unwrap_or_default().to_string();
        node.methods.lock().unwrap().push(method.clone());
        if method == "eth_estimateGas" {
            // Widen the window in which an unserialized second submission could read the same nonce
            sleep(Duration::from_millis(20)).await;
        }
        let result = node.respond(&method, &req["params"]);
        Json(json!({"jsonrpc": "2.0", "id": req["id"], "result": result}))
    }

    async fn spawn_node(node: Arc<MockNode>) -> String {
        let app = Router::new().route("/", post(rpc)).with_state(node);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn ledger(node: Arc<MockNode>, timeout_secs: u64) -> RpcLedger {
        let chain = ChainConfig {
            rpc_url: spawn_node(node).await,
            private_key: HARDHAT_KEY.to_string(),
            contract_address: CONTRACT.to_string(),
            confirmation_timeout_secs: timeout_secs,
            poll_interval_ms: 10,
            ..ChainConfig::default()
        };
        RpcLedger::connect(&chain.settings().unwrap()).await.unwrap()
    }

    fn unreachable_settings(private_key: &str) -> ChainSettings {
        ChainConfig {
            rpc_url: "http://127.0.0.1:9".to_string(),
            private_key: private_key.to_string(),
            contract_address: CONTRACT.to_string(),
            confirmation_timeout_secs: 1,
            poll_interval_ms: 10,
            ..ChainConfig::default()
        }
        .settings()
        .unwrap()
    }

    #[test]
    fn test_receipt_status() {
        let ok: Receipt = serde_json::from_value(json!({
            "transactionHash": "0x01",
            "status": "0x1",
            "logs": []
        }))
        .unwrap();
        assert!(ok.succeeded());

        let reverted: Receipt = serde_json::from_value(json!({
            "transactionHash": "0x02",
            "status": "0x0"
        }))
        .unwrap();
        assert!(!reverted.succeeded());
        assert!(reverted.logs.is_empty());
    }

    #[test]
    fn test_raw_nonce_helper() {
        let tx = LegacyTransaction {
            nonce: 0x1234,
            gas_price: 1,
            gas_limit: 21000,
            to: [0u8; 20],
            value: 0,
            data: vec![],
        };
        let wallet = Wallet::from_hex(HARDHAT_KEY).unwrap();
        assert_eq!(raw_nonce(&wallet.sign(&tx, 31337).unwrap()), 0x1234);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_key() {
        assert!(matches!(
            RpcLedger::connect(&unreachable_settings("not-a-key")).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_unreachable_node() {
        assert!(matches!(
            RpcLedger::connect(&unreachable_settings(HARDHAT_KEY)).await,
            Err(Error::ChainUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_create_trip_reads_event_id() {
        let node = MockNode::new(ReceiptMode::Mined);
        let ledger = ledger(node.clone(), 5).await;
        assert_eq!(ledger.chain_id, 31337);

        let created = ledger.create_trip("{\"owner\":\"alice\"}").await.unwrap();

        assert_eq!(created.on_chain_trip_id, Some(7));
        assert_eq!(created.transaction_hash, format!("0x{:064x}", 1));
        assert_eq!(*node.submitted_nonces.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_concurrent_writes_use_distinct_nonces() {
        let node = MockNode::new(ReceiptMode::Mined);
        let ledger = ledger(node.clone(), 5).await;

        let (a, b) = tokio::join!(
            ledger.update_status(1, TripStatus::Active),
            ledger.update_status(2, TripStatus::Active)
        );
        assert_ne!(a.unwrap(), b.unwrap());

        assert_eq!(*node.submitted_nonces.lock().unwrap(), vec![0, 1]);
        // Each submission runs start to finish before the next one reads a nonce
        let one = [
            "eth_getTransactionCount",
            "eth_gasPrice",
            "eth_estimateGas",
            "eth_sendRawTransaction",
        ];
        let expected: Vec<String> = one.iter().chain(one.iter()).map(|m| m.to_string()).collect();
        assert_eq!(node.submissions()[1..], expected[..]);
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_rejected() {
        let node = MockNode::new(ReceiptMode::Reverted);
        let ledger = ledger(node, 5).await;

        assert!(matches!(
            ledger.update_status(3, TripStatus::Completed).await,
            Err(Error::ChainRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfirmed_transaction_times_out() {
        let node = MockNode::new(ReceiptMode::Pending);
        let ledger = ledger(node.clone(), 0).await;

        assert!(matches!(
            ledger.create_trip("{}").await,
            Err(Error::ChainUnavailable(_))
        ));
        assert!(node
            .methods
            .lock()
            .unwrap()
            .contains(&"eth_getTransactionReceipt".to_string()));
    }
}
