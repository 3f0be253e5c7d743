//! Wallet key material
//!
//! Wallets are simulated: the key material is 32 random bytes rendered as hex,
//! and the address is derived from it with a one-way digest:
//!
//! ```text
//! key     = hex(random 32 bytes)                 (64 chars)
//! address = "0x" + last 40 hex chars of SHA-256(key)
//! ```
//!
//! Key material is never persisted in clear. [`KeyVault`] seals it with
//! ChaCha20-Poly1305 under a single process-wide key and stores
//! `base64(nonce || ciphertext)`.

use crate::types::MarketError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

/// Nonce length of ChaCha20-Poly1305, in bytes
const NONCE_LEN: usize = 12;

/// Number of trailing digest hex characters kept in an address
const ADDRESS_HEX_LEN: usize = 40;

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate fresh 256-bit key material as lowercase hex
pub fn generate_key_material() -> String {
    random_hex(32)
}

/// Derive the public address for `key_material`
///
/// The derivation is stable: the same key always yields the same address.
pub fn derive_address(key_material: &str) -> String {
    let digest = hex::encode(Sha256::digest(key_material.as_bytes()));
    format!("0x{}", &digest[digest.len() - ADDRESS_HEX_LEN..])
}

/// Generate a simulated on-chain transaction hash
pub fn simulated_hash() -> String {
    format!("0x{}", random_hex(32))
}

/// Symmetric sealing of wallet key material
pub struct KeyVault {
    cipher: ChaCha20Poly1305,
}

impl KeyVault {
    /// Create a vault with a freshly generated key
    ///
    /// Material sealed by this vault cannot be opened after the process
    /// exits unless the key is configured explicitly.
    pub fn generate() -> Self {
        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        Self {
            cipher: ChaCha20Poly1305::new(&key),
        }
    }

    /// Create a vault from a base64-encoded 32-byte key
    pub fn from_base64(encoded: &str) -> Result<Self, MarketError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| MarketError::crypto(format!("invalid vault key encoding: {}", e)))?;
        let cipher = ChaCha20Poly1305::new_from_slice(&bytes)
            .map_err(|_| MarketError::crypto("vault key must be 32 bytes"))?;
        Ok(Self { cipher })
    }

    /// Use the configured key if present, otherwise generate one
    pub fn from_config(key: Option<&str>) -> Result<Self, MarketError> {
        match key {
            Some(encoded) => Self::from_base64(encoded),
            None => Ok(Self::generate()),
        }
    }

    /// Seal `secret` for storage
    pub fn encrypt(&self, secret: &str) -> Result<String, MarketError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, secret.as_bytes())
            .map_err(|e| MarketError::crypto(format!("encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    /// Open a value produced by [`KeyVault::encrypt`]
    pub fn decrypt(&self, sealed: &str) -> Result<String, MarketError> {
        let bytes = BASE64
            .decode(sealed)
            .map_err(|e| MarketError::crypto(format!("invalid sealed key encoding: {}", e)))?;
        if bytes.len() <= NONCE_LEN {
            return Err(MarketError::crypto("sealed key is truncated"));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| MarketError::crypto("sealed key failed authentication"))?;

        String::from_utf8(plaintext).map_err(MarketError::crypto)
    }
}

impl fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyVault").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_material_is_64_hex_chars() {
        let key = generate_key_material();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_key_material());
    }

    #[test]
    fn test_address_is_stable_and_eth_like() {
        let key = generate_key_material();
        let address = derive_address(&key);

        assert_eq!(address, derive_address(&key));
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 2 + ADDRESS_HEX_LEN);
    }

    #[test]
    fn test_address_uses_digest_tail() {
        let digest = hex::encode(Sha256::digest(b"abc"));
        assert_eq!(derive_address("abc"), format!("0x{}", &digest[24..]));
    }

    #[test]
    fn test_simulated_hash_shape() {
        let hash = simulated_hash();
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);
    }

    #[test]
    fn test_encrypt_hides_and_recovers_secret() {
        let vault = KeyVault::generate();
        let secret = generate_key_material();

        let sealed = vault.encrypt(&secret).unwrap();

        assert!(!sealed.contains(&secret));
        assert_eq!(vault.decrypt(&sealed).unwrap(), secret);
    }

    #[test]
    fn test_encrypt_uses_fresh_nonce() {
        let vault = KeyVault::generate();
        assert_ne!(vault.encrypt("same").unwrap(), vault.encrypt("same").unwrap());
    }

    #[test]
    fn test_other_vault_cannot_decrypt() {
        let sealed = KeyVault::generate().encrypt("secret").unwrap();
        let result = KeyVault::generate().decrypt(&sealed);
        assert!(matches!(result, Err(MarketError::Crypto { .. })));
    }

    #[test]
    fn test_configured_key_round_trips_across_instances() {
        let encoded = BASE64.encode([7u8; 32]);
        let sealed = KeyVault::from_base64(&encoded)
            .unwrap()
            .encrypt("secret")
            .unwrap();

        let reopened = KeyVault::from_config(Some(&encoded)).unwrap();
        assert_eq!(reopened.decrypt(&sealed).unwrap(), "secret");
    }

    #[test]
    fn test_rejects_short_key() {
        let encoded = BASE64.encode([7u8; 16]);
        assert!(matches!(
            KeyVault::from_base64(&encoded),
            Err(MarketError::Crypto { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_ciphertext() {
        let vault = KeyVault::generate();
        let truncated = BASE64.encode([0u8; 8]);
        assert!(vault.decrypt(&truncated).is_err());
    }
}
