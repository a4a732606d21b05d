//! Ledger wallet address validation
//!
//! Addresses are base58-encoded 32-byte public keys. The service never holds
//! the matching private keys; it only checks the shape before handing the
//! address to the issuance gateway.

use crate::types::CropchainError;

/// Decoded length of a ledger public key
pub const ADDRESS_BYTES: usize = 32;

/// Validate and normalize (trim) a wallet address
pub fn parse_wallet_address(raw: &str) -> Result<String, CropchainError> {
    let address = raw.trim();
    if address.is_empty() {
        return Err(CropchainError::Validation("Wallet address is empty".into()));
    }

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|_| CropchainError::Validation(format!("Invalid wallet address: {address}")))?;

    if bytes.len() != ADDRESS_BYTES {
        return Err(CropchainError::Validation(format!(
            "Invalid wallet address: {address} (expected {ADDRESS_BYTES} bytes, got {})",
            bytes.len()
        )));
    }

    Ok(address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_32_byte_key() {
        let address = bs58::encode([7u8; 32]).into_string();
        assert_eq!(parse_wallet_address(&address).unwrap(), address);
        assert_eq!(parse_wallet_address(&format!("  {address} ")).unwrap(), address);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let short = bs58::encode([7u8; 20]).into_string();
        assert!(parse_wallet_address(&short).is_err());
    }

    #[test]
    fn test_rejects_non_base58() {
        // '0', 'O', 'I' and 'l' are outside the base58 alphabet
        assert!(parse_wallet_address("0OIl").is_err());
        assert!(parse_wallet_address("   ").is_err());
    }
}
