//! Two-way encryption for encrypted field values.
//!
//! Ciphertexts are stored as hex of `nonce || ciphertext` (AES-256-GCM).

use crate::error::{RecordError, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Symmetric cipher bound to one key.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    /// Cipher with a freshly generated key.
    pub fn random() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        }
    }

    /// Cipher for a hex-encoded 256-bit key.
    pub fn from_hex_key(key: &str) -> Result<Self> {
        let bytes = hex::decode(key.trim())
            .map_err(|e| RecordError::Store(format!("Invalid encryption key: {e}")))?;
        let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|_| {
            RecordError::Store(format!(
                "Invalid encryption key: expected {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| RecordError::Store("Encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let raw = hex::decode(stored)
            .map_err(|e| RecordError::Store(format!("Corrupt ciphertext: {e}")))?;
        if raw.len() < NONCE_LEN {
            return Err(RecordError::Store("Corrupt ciphertext: too short".into()));
        }
        let (nonce_raw, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_raw), ciphertext)
            .map_err(|_| RecordError::Store("Decryption failed".into()))?;
        String::from_utf8(plaintext)
            .map_err(|_| RecordError::Store("Decrypted value is not UTF-8".into()))
    }
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldCipher(..)")
    }
}
