//! Solidity ABI encoding for the TripRegistry calls
//!
//! Only the handful of shapes the registry needs: `uint` words, one dynamic
//! `string`, and the `(address, string, uint8)` trip record. The
//! `updateStatus` signature is passed in since deployments may differ.

use crate::constants::contract::{CREATE_TRIP, GET_TRIP, TOTAL_TRIPS};
use crate::error::{Error, Result};
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// Selector of the standard `Error(string)` revert payload
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// A trip record as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTrip {
    pub creator: [u8; 20],
    pub meta: String,
    pub status: u8,
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First four bytes of the keccak hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word_u64(n: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&n.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Calldata for `createTrip(string)`
pub fn encode_create_trip(meta: &str) -> Vec<u8> {
    let bytes = meta.as_bytes();
    let mut out = Vec::with_capacity(4 + WORD * 2 + padded_len(bytes.len()));
    out.extend_from_slice(&selector(CREATE_TRIP));
    out.extend_from_slice(&word_u64(WORD as u64)); // offset of the string
    out.extend_from_slice(&word_u64(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(4 + WORD * 2 + padded_len(bytes.len()), 0);
    out
}

/// Calldata for `updateStatus(tripId, status)` under `signature`
///
/// Both arguments are static integer types, so a `uint8` or `uint256` status
/// encodes to the same word; only the selector changes.
pub fn encode_update_status(signature: &str, trip_id: u64, status: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD * 2);
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&word_u64(trip_id));
    out.extend_from_slice(&word_u64(status as u64));
    out
}

/// Calldata for `getTrip(uint256)`
pub fn encode_get_trip(trip_id: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD);
    out.extend_from_slice(&selector(GET_TRIP));
    out.extend_from_slice(&word_u64(trip_id));
    out
}

/// Calldata for `totalTrips()`
pub fn encode_total_trips() -> Vec<u8> {
    selector(TOTAL_TRIPS).to_vec()
}

/// Bytes `start..start + len` of `data`; offsets come from the node, so the end may overflow
fn slice_at(data: &[u8], start: usize, len: usize) -> Option<&[u8]> {
    let end = start.checked_add(len)?;
    data.get(start..end)
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8]> {
    slice_at(data, offset, WORD)
        .ok_or_else(|| Error::ChainUnavailable(format!("ABI data too short at offset {}", offset)))
}

/// Read a 32-byte word as u64, rejecting values that do not fit
pub fn decode_u64(word: &[u8]) -> Result<u64> {
    if word.len() != WORD {
        return Err(Error::ChainUnavailable(format!(
            "Expected 32-byte word, got {} bytes",
            word.len()
        )));
    }
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(Error::ChainUnavailable("uint value exceeds u64".to_string()));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(buf))
}

fn decode_usize(word: &[u8]) -> Result<usize> {
    usize::try_from(decode_u64(word)?)
        .map_err(|_| Error::ChainUnavailable("ABI offset too large".to_string()))
}

/// Decode a dynamic `string` whose head starts at `start`
fn decode_string_at(data: &[u8], start: usize) -> Result<String> {
    let len = decode_usize(word_at(data, start)?)?;
    let bytes = start
        .checked_add(WORD)
        .and_then(|body| slice_at(data, body, len))
        .ok_or_else(|| Error::ChainUnavailable("ABI string runs past end of data".to_string()))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::ChainUnavailable("ABI string is not UTF-8".to_string()))
}

/// Decode the single `uint256` returned by `totalTrips()`
pub fn decode_total_trips(data: &[u8]) -> Result<u64> {
    decode_u64(word_at(data, 0)?)
}

/// Decode the return data of `getTrip(uint256)`
///
/// Accepts both the struct encoding (a leading offset word pointing at the
/// tuple) and the flat `(address, string, uint8)` multi-return encoding.
pub fn decode_trip(data: &[u8]) -> Result<RawTrip> {
    let first = word_at(data, 0)?;
    let base = if decode_u64(first).ok() == Some(WORD as u64) {
        WORD
    } else {
        0
    };

    let creator_word = word_at(data, base)?;
    if creator_word[..12].iter().any(|b| *b != 0) {
        return Err(Error::ChainUnavailable("Malformed address word".to_string()));
    }
    let mut creator = [0u8; 20];
    creator.copy_from_slice(&creator_word[12..]);

    let meta_offset = decode_usize(word_at(data, base + WORD)?)?;
    let status = decode_u64(word_at(data, base + WORD * 2)?)?;
    let status = u8::try_from(status)
        .map_err(|_| Error::ChainUnavailable(format!("Status {} out of range", status)))?;
    let meta_start = base
        .checked_add(meta_offset)
        .ok_or_else(|| Error::ChainUnavailable("ABI string offset overflows".to_string()))?;
    let meta = decode_string_at(data, meta_start)?;

    Ok(RawTrip {
        creator,
        meta,
        status,
    })
}

/// Extract the message from an `Error(string)` revert payload
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let body = data.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
    let offset = decode_usize(word_at(body, 0).ok()?).ok()?;
    decode_string_at(body, offset).ok()
}

#[cfg(test)]
pub(crate) fn encode_error_string(reason: &str) -> Vec<u8> {
    let mut out = ERROR_STRING_SELECTOR.to_vec();
    // Same layout as createTrip's string argument
    out.extend_from_slice(&encode_create_trip(reason)[4..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::contract::UPDATE_STATUS;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(selector("Error(string)"), ERROR_STRING_SELECTOR);
    }

    #[test]
    fn test_encode_create_trip_layout() {
        let data = encode_create_trip("hi");

        assert_eq!(data.len(), 4 + 32 * 3);
        assert_eq!(&data[..4], &selector(CREATE_TRIP));
        assert_eq!(decode_u64(&data[4..36]).unwrap(), 32);
        assert_eq!(decode_u64(&data[36..68]).unwrap(), 2);
        assert_eq!(&data[68..70], b"hi");
        assert!(data[70..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_create_trip_exact_word() {
        let meta = "a".repeat(32);
        assert_eq!(encode_create_trip(&meta).len(), 4 + 32 * 3);
        assert_eq!(encode_create_trip("").len(), 4 + 32 * 2);
    }

    #[test]
    fn test_encode_update_status() {
        let data = encode_update_status(UPDATE_STATUS, 7, 2);

        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &selector("updateStatus(uint256,uint256)"));
        assert_eq!(decode_u64(&data[4..36]).unwrap(), 7);
        assert_eq!(decode_u64(&data[36..68]).unwrap(), 2);

        let narrow = encode_update_status("updateStatus(uint256,uint8)", 7, 2);
        assert_ne!(&narrow[..4], &data[..4]);
        assert_eq!(&narrow[4..], &data[4..]);
    }

    #[test]
    fn test_decode_u64_overflow() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(decode_u64(&word).is_err());
        assert!(decode_u64(&[0u8; 31]).is_err());
    }

    fn trip_tuple(creator: [u8; 20], meta: &str, status: u8) -> Vec<u8> {
        let mut tuple = Vec::new();
        let mut creator_word = [0u8; 32];
        creator_word[12..].copy_from_slice(&creator);
        tuple.extend_from_slice(&creator_word);
        tuple.extend_from_slice(&word_u64(96)); // meta follows the three head words
        tuple.extend_from_slice(&word_u64(status as u64));
        tuple.extend_from_slice(&encode_create_trip(meta)[36..]);
        tuple
    }

    #[test]
    fn test_decode_trip_flat() {
        let creator = [0x11u8; 20];
        let raw = decode_trip(&trip_tuple(creator, "{\"note\":\"x\"}", 1)).unwrap();

        assert_eq!(raw.creator, creator);
        assert_eq!(raw.meta, "{\"note\":\"x\"}");
        assert_eq!(raw.status, 1);
    }

    #[test]
    fn test_decode_trip_struct() {
        let creator = [0x22u8; 20];
        let mut data = word_u64(32).to_vec();
        data.extend(trip_tuple(creator, "meta", 2));

        let raw = decode_trip(&data).unwrap();
        assert_eq!(raw.creator, creator);
        assert_eq!(raw.meta, "meta");
        assert_eq!(raw.status, 2);
    }

    #[test]
    fn test_decode_trip_truncated() {
        let data = trip_tuple([0x33u8; 20], "meta", 0);
        assert!(decode_trip(&data[..70]).is_err());
    }

    #[test]
    fn test_decode_total_trips() {
        assert_eq!(decode_total_trips(&word_u64(12)).unwrap(), 12);
        assert!(decode_total_trips(&[]).is_err());
    }

    #[test]
    fn test_revert_reason() {
        let data = encode_error_string("Only creator can update");
        assert_eq!(
            decode_revert_reason(&data).as_deref(),
            Some("Only creator can update")
        );
        assert_eq!(decode_revert_reason(&[0xde, 0xad]), None);
    }

    #[test]
    fn test_decode_trip_huge_offset() {
        let mut data = trip_tuple([0x44u8; 20], "meta", 1);
        data[32..64].copy_from_slice(&word_u64(u64::MAX));

        assert!(matches!(decode_trip(&data), Err(Error::ChainUnavailable(_))));

        // Same offset behind the struct wrapper
        let mut wrapped = word_u64(32).to_vec();
        wrapped.extend(data);
        assert!(matches!(decode_trip(&wrapped), Err(Error::ChainUnavailable(_))));
    }

    #[test]
    fn test_revert_reason_huge_length() {
        let mut data = encode_error_string("Only creator can update");
        // Length word follows the selector and the offset word
        data[36..68].copy_from_slice(&word_u64(u64::MAX));
        assert_eq!(decode_revert_reason(&data), None);

        let mut data = encode_error_string("x");
        data[4..36].copy_from_slice(&word_u64(u64::MAX));
        assert_eq!(decode_revert_reason(&data), None);
    }
}
