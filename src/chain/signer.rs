//! Transaction signing with a secp256k1 key

use crate::chain::abi::keccak256;
use crate::chain::rlp;
use crate::error::{Error, Result};
use k256::ecdsa::SigningKey;

/// A legacy (pre-1559) transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: [u8; 20],
    pub value: u128,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::encode_uint(self.nonce as u128),
            rlp::encode_uint(self.gas_price),
            rlp::encode_uint(self.gas_limit as u128),
            rlp::encode_bytes(&self.to),
            rlp::encode_uint(self.value),
            rlp::encode_bytes(&self.data),
        ]
    }

    /// RLP payload hashed for an EIP-155 signature
    pub fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let mut fields = self.fields();
        fields.push(rlp::encode_uint(chain_id as u128));
        fields.push(rlp::encode_uint(0));
        fields.push(rlp::encode_uint(0));
        rlp::encode_list(&fields)
    }
}

/// Holds the deployer key and derived address
#[derive(Clone)]
pub struct Wallet {
    key: SigningKey,
    address: [u8; 20],
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address_hex())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Parse a hex private key, with or without `0x`
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let bytes = decode_hex(private_key)
            .map_err(|_| Error::Config("Private key is not valid hex".to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| Error::Config("Private key is not a valid secp256k1 scalar".to_string()))?;

        let point = key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);

        Ok(Self { key, address })
    }

    pub fn address(&self) -> [u8; 20] {
        self.address
    }

    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }

    /// Sign `tx` for `chain_id` and return the raw RLP transaction
    pub fn sign(&self, tx: &LegacyTransaction, chain_id: u64) -> Result<Vec<u8>> {
        let hash = keccak256(&tx.signing_payload(chain_id));
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| Error::ChainUnavailable(format!("Signing failed: {}", e)))?;

        let v = chain_id as u128 * 2 + 35 + recovery_id.to_byte() as u128;
        let sig = signature.to_bytes();

        let mut fields = tx.fields();
        fields.push(rlp::encode_uint(v));
        fields.push(rlp::encode_bytes(strip_leading_zeros(&sig[..32])));
        fields.push(rlp::encode_bytes(strip_leading_zeros(&sig[32..])));
        Ok(rlp::encode_list(&fields))
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Decode a `0x`-prefixed (or bare) hex string
pub fn decode_hex(s: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    let s = s.trim();
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

/// Parse a 20-byte address
pub fn parse_address(s: &str) -> Result<[u8; 20]> {
    let bytes = decode_hex(s).map_err(|_| Error::Config(format!("Invalid address: {}", s)))?;
    <[u8; 20]>::try_from(bytes.as_slice())
        .map_err(|_| Error::Config(format!("Address must be 20 bytes: {}", s)))
}
