use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 100_000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// Blob is too short to even hold the salt and nonce prefix.
    #[error("encrypted payload is malformed (too short)")]
    Malformed,
    /// Wrong password or tampered/corrupted ciphertext. Deliberately one
    /// variant for both: the caller must not be able to tell them apart.
    #[error("authentication failed: incorrect password or corrupted data")]
    AuthFailed,
    #[error("encryption failed")]
    EncryptFailed,
}

/// PBKDF2-HMAC-SHA256 with a fixed round count. Same password and salt
/// always yield the same key.
pub fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

/// Encrypts `plaintext` into a self-contained blob: `salt || nonce ||
/// ciphertext`. A fresh salt and nonce are drawn per call, so two
/// encryptions of the same input never produce the same blob.
pub fn encrypt(plaintext: &str, password: &str) -> Result<Vec<u8>, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce);
    let key = derive_key(password, &salt);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptFailed)?;
    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Splits the salt/nonce prefix off `blob`, re-derives the key, and
/// authenticated-decrypts the rest back to text.
pub fn decrypt(blob: &[u8], password: &str) -> Result<String, CryptoError> {
    if blob.len() <= SALT_LEN + NONCE_LEN {
        return Err(CryptoError::Malformed);
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let key = derive_key(password, salt);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthFailed)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::AuthFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let blob = encrypt("name: Proj\n", "s3cr3t").unwrap();
        assert_eq!(decrypt(&blob, "s3cr3t").unwrap(), "name: Proj\n");
    }

    #[test]
    fn wrong_password_is_auth_failure() {
        let blob = encrypt("payload", "correct").unwrap();
        assert_eq!(decrypt(&blob, "wrong").unwrap_err(), CryptoError::AuthFailed);
    }

    #[test]
    fn tampered_blob_is_auth_failure() {
        let mut blob = encrypt("payload", "pw").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert_eq!(decrypt(&blob, "pw").unwrap_err(), CryptoError::AuthFailed);
    }

    #[test]
    fn short_blob_is_malformed() {
        assert_eq!(decrypt(&[0u8; 10], "pw").unwrap_err(), CryptoError::Malformed);
        assert_eq!(
            decrypt(&[0u8; SALT_LEN + 12], "pw").unwrap_err(),
            CryptoError::Malformed
        );
    }

    #[test]
    fn encryption_is_non_deterministic() {
        let a = encrypt("same input", "pw").unwrap();
        let b = encrypt("same input", "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_derivation_is_stable_per_salt() {
        let salt = [7u8; SALT_LEN];
        assert_eq!(derive_key("pw", &salt), derive_key("pw", &salt));
        assert_ne!(derive_key("pw", &salt), derive_key("pw", &[8u8; SALT_LEN]));
    }
}
