// crates/wstar-core/src/crypto.rs
//
// Hashing helpers used to derive account and contract addresses.
//
// Addresses are the trailing 20 bytes of a SHA-256 digest, mirroring the way
// Ethereum truncates a 32-byte hash into an account identifier.

use sha2::{Digest, Sha256};

use crate::error::WstarError;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Compute SHA-256 hash of the given bytes.
///
/// Returns a 32-byte hash.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Truncate a 32-byte digest to its trailing 20 bytes.
pub fn truncate_to_address(digest: &[u8; 32]) -> [u8; ADDRESS_LEN] {
    let mut output = [0u8; ADDRESS_LEN];
    output.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
    output
}

/// Derive address bytes for a contract created by `deployer` at `nonce`.
pub fn contract_address_bytes(deployer: &[u8; ADDRESS_LEN], nonce: u64) -> [u8; ADDRESS_LEN] {
    let mut preimage = Vec::with_capacity(ADDRESS_LEN + 8);
    preimage.extend_from_slice(deployer);
    preimage.extend_from_slice(&nonce.to_be_bytes());
    truncate_to_address(&hash_bytes(&preimage))
}

/// Parse a 32-byte networking key from hex (with or without `0x`).
///
/// Short input is left-padded with zeros, so `0x01` is the key whose last
/// byte is 1.
///
/// # Errors
/// Returns `WstarError::Parse` for non-hex input or more than 32 bytes.
pub fn parse_key(input: &str) -> Result<[u8; 32], WstarError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.len() > 64 {
        return Err(WstarError::Parse(format!(
            "Key {:?} is longer than 32 bytes",
            input
        )));
    }
    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(&padded)
        .map_err(|e| WstarError::Parse(format!("Invalid key {:?}: {}", input, e)))?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
