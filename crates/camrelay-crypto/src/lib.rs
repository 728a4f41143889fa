//! camrelay crypto library
//!
//! The two primitives the relay protocol is built on:
//!
//! - **Hash**: SHA-512 (FIPS 180-4), implemented in full in [`sha512`]. Used for
//!   frame fingerprints and password-based key derivation.
//! - **Encryption**: AES-256 in counter mode (128-bit big-endian counter, no
//!   padding) with caller-supplied key and IV, in [`cipher`].

pub mod cipher;
pub mod error;
pub mod sha512;

pub use cipher::{IV_SIZE, KEY_SIZE, SymmetricKey, decrypt, encrypt, generate_iv};
pub use error::CryptoError;
pub use sha512::{
    DIGEST_SIZE, Sha512, derive_key, derive_key_hex, sha512, sha512_hex, sha512_hex_with_salt,
};
