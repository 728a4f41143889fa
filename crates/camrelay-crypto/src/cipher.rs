//! AES-256-CTR encryption with caller-supplied key and IV.
//!
//! No key management lives here: the relay looks keys up by version and
//! hands them in together with the IV that travelled with the payload.
//! CTR is a stream mode, so ciphertext length always equals plaintext length.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// IV / initial counter block size in bytes.
pub const IV_SIZE: usize = 16;

/// AES-256 with a 128-bit big-endian counter seeded from the IV.
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A 256-bit symmetric key. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice, rejecting anything but exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Generate a random 16-byte IV.
///
/// Every encryption under a given key needs its own IV; reusing one leaks
/// the XOR of the two plaintexts.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Validate key and IV lengths, then build the keystream generator.
fn keystream(key: &[u8], iv: &[u8]) -> Result<Aes256Ctr, CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidIvLength {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }
    Aes256Ctr::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: key.len(),
    })
}

fn apply(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut cipher = keystream(key, iv)?;
    let mut buf = data.to_vec();
    cipher
        .try_apply_keystream(&mut buf)
        .map_err(|_| CryptoError::KeystreamExhausted)?;
    Ok(buf)
}

/// Encrypt `plaintext` under `key` (32 bytes) and `iv` (16 bytes).
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    apply(plaintext, key, iv)
}

/// Decrypt `ciphertext` under `key` (32 bytes) and `iv` (16 bytes).
///
/// CTR has no authentication tag: a wrong key yields garbage rather than an
/// error, so callers must validate the plaintext themselves.
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    apply(ciphertext, key, iv)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// NIST SP 800-38A, F.5.5 CTR-AES256.Encrypt.
    const NIST_KEY: &str = "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4";
    const NIST_IV: &str = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";
    const NIST_PLAINTEXT: &str = "6bc1bee22e409f96e93d7e117393172a\
                                  ae2d8a571e03ac9c9eb76fac45af8e51\
                                  30c81c46a35ce411e5fbc1191a0a52ef\
                                  f69f2445df4f9b17ad2b417be66c3710";
    const NIST_CIPHERTEXT: &str = "601ec313775789a5b7a7f504bbf3d228\
                                   f443e3ca4d62b59aca84e990cacaf5c5\
                                   2b0930daa23de94ce87017ba2d84988d\
                                   dfc9c58db67aada613c2dd08457941a6";

    #[test]
    fn nist_ctr_vector() {
        let key = hex::decode(NIST_KEY).unwrap();
        let iv = hex::decode(NIST_IV).unwrap();
        let plaintext = hex::decode(NIST_PLAINTEXT).unwrap();

        let ciphertext = encrypt(&plaintext, &key, &iv).unwrap();
        assert_eq!(hex::encode(&ciphertext), NIST_CIPHERTEXT);
        assert_eq!(decrypt(&ciphertext, &key, &iv).unwrap(), plaintext);
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = SymmetricKey::generate();
        let iv = generate_iv();
        let plaintext = b"{\"action\":\"flash_on\"}";

        let ciphertext = encrypt(plaintext, key.as_bytes(), &iv).unwrap();
        assert_ne!(ciphertext.as_slice(), plaintext.as_slice());
        assert_eq!(ciphertext.len(), plaintext.len());

        let decrypted = decrypt(&ciphertext, key.as_bytes(), &iv).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn encryption_is_deterministic_for_fixed_inputs() {
        let key = [7u8; KEY_SIZE];
        let iv = [9u8; IV_SIZE];
        let a = encrypt(b"same input", &key, &iv).unwrap();
        let b = encrypt(b"same input", &key, &iv).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partial_block_and_empty_input() {
        let key = [1u8; KEY_SIZE];
        let iv = [2u8; IV_SIZE];
        assert!(encrypt(b"", &key, &iv).unwrap().is_empty());

        let odd = vec![0x5au8; 37];
        let ciphertext = encrypt(&odd, &key, &iv).unwrap();
        assert_eq!(ciphertext.len(), 37);
        assert_eq!(decrypt(&ciphertext, &key, &iv).unwrap(), odd);
    }

    #[test]
    fn rejects_wrong_key_length() {
        let iv = [0u8; IV_SIZE];
        for len in [0, 16, 31, 33, 64] {
            let key = vec![0u8; len];
            assert_eq!(
                encrypt(b"x", &key, &iv),
                Err(CryptoError::InvalidKeyLength { expected: 32, actual: len })
            );
            assert!(matches!(
                decrypt(b"x", &key, &iv),
                Err(CryptoError::InvalidKeyLength { .. })
            ));
        }
    }

    #[test]
    fn rejects_wrong_iv_length() {
        let key = [0u8; KEY_SIZE];
        for len in [0, 12, 15, 17, 32] {
            let iv = vec![0u8; len];
            assert_eq!(
                decrypt(b"x", &key, &iv),
                Err(CryptoError::InvalidIvLength { expected: 16, actual: len })
            );
        }
    }

    #[test]
    fn key_length_checked_before_iv() {
        assert!(matches!(
            encrypt(b"x", &[0u8; 3], &[0u8; 3]),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn generated_ivs_differ() {
        assert_ne!(generate_iv(), generate_iv());
    }

    #[test]
    fn symmetric_key_from_slice_validates_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 32]).is_ok());
        assert_eq!(
            SymmetricKey::from_slice(&[0u8; 24]),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 24 })
        );
    }

    #[test]
    fn symmetric_key_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_SIZE]);
        let debug = format!("{key:?}");
        assert!(!debug.contains("ab"), "{debug}");
        assert!(!debug.contains("171"), "{debug}");
    }
}
