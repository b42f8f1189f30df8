//! Decoding of `TripCreated` logs from transaction receipts

use crate::chain::abi::{decode_u64, keccak256};
use crate::chain::signer::decode_hex;
use serde::Deserialize;
use tracing::{debug, warn};

/// A log entry as returned in `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// Topic0 of the event with the given signature
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

/// Decode the trip id from a `TripCreated` log, or `None` if the log is anything else
///
/// The id is read from the first indexed topic when present, otherwise from
/// the first data word.
pub fn decode_trip_created(log: &LogEntry, contract: &str, topic: &str) -> Option<u64> {
    if !log.address.eq_ignore_ascii_case(contract) {
        return None;
    }
    if !log.topics.first()?.eq_ignore_ascii_case(topic) {
        return None;
    }

    let word = match log.topics.get(1) {
        Some(indexed) => decode_hex(indexed).ok()?,
        None => {
            let data = decode_hex(&log.data).ok()?;
            data.get(..32)?.to_vec()
        }
    };
    decode_u64(&word).ok()
}

/// Find the first decodable `TripCreated` id among `logs`
///
/// `topic` is the configured event topic, see [`event_topic`].
pub fn first_trip_created(logs: &[LogEntry], contract: &str, topic: &str) -> Option<u64> {
    let id = logs
        .iter()
        .find_map(|log| decode_trip_created(log, contract, topic));
    if id.is_some() {
        return id;
    }

    let from_contract = logs
        .iter()
        .filter(|log| log.address.eq_ignore_ascii_case(contract))
        .count();
    if from_contract > 0 {
        // The contract did emit something, so the configured event signature is likely wrong
        warn!(
            from_contract,
            %topic,
            "contract logs did not match the TripCreated topic; check chain.trip_created_event"
        );
    } else {
        debug!(count = logs.len(), "no TripCreated event in receipt");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::contract::TRIP_CREATED_EVENT;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn trip_created_topic() -> String {
        event_topic(TRIP_CREATED_EVENT)
    }

    fn first(logs: &[LogEntry]) -> Option<u64> {
        first_trip_created(logs, CONTRACT, &trip_created_topic())
    }

    fn word(n: u64) -> String {
        format!("0x{:064x}", n)
    }

    fn log(address: &str, topics: Vec<String>, data: &str) -> LogEntry {
        LogEntry {
            address: address.to_string(),
            topics,
            data: data.to_string(),
        }
    }

    #[test]
    fn test_indexed_trip_id() {
        let logs = vec![log(
            &CONTRACT.to_lowercase(),
            vec![trip_created_topic(), word(5), word(0xabc)],
            "0x",
        )];
        assert_eq!(first(&logs), Some(5));
    }

    #[test]
    fn test_trip_id_from_data() {
        let data = format!("{}{}", word(9), "00".repeat(64));
        let logs = vec![log(CONTRACT, vec![trip_created_topic()], &data)];
        assert_eq!(first(&logs), Some(9));
    }

    #[test]
    fn test_foreign_logs_are_skipped() {
        let other_topic = format!("0x{}", hex::encode(keccak256(b"Transfer(address,address,uint256)")));
        let logs = vec![
            log(CONTRACT, vec![other_topic], "0x"),
            log(
                "0x0000000000000000000000000000000000000001",
                vec![trip_created_topic(), word(1)],
                "0x",
            ),
            log(CONTRACT, vec![], "0x"),
            log(CONTRACT, vec![trip_created_topic(), word(3)], "0x"),
        ];
        assert_eq!(first(&logs), Some(3));
    }

    #[test]
    fn test_no_event() {
        assert_eq!(first(&[]), None);

        let truncated = vec![log(CONTRACT, vec![trip_created_topic()], "0x01")];
        assert_eq!(first(&truncated), None);
    }

    #[test]
    fn test_receipt_log_deserializes() {
        let raw = serde_json::json!({
            "address": CONTRACT,
            "topics": [trip_created_topic(), word(2)],
            "data": "0x",
            "logIndex": "0x0",
            "removed": false
        });
        let entry: LogEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(first(&[entry]), Some(2));
    }

    #[test]
    fn test_configured_event_signature() {
        let custom = event_topic("TripCreated(uint256,address)");
        let logs = vec![log(CONTRACT, vec![custom.clone(), word(4)], "0x")];

        assert_eq!(first(&logs), None);
        assert_eq!(first_trip_created(&logs, CONTRACT, &custom), Some(4));
    }
}
