//! Public keys and public key tokens.
//!
//! A strong-named assembly is identified by its full public key in the `Assembly` table,
//! while references to it usually carry only the 8-byte token derived from that key. The
//! token is the last 8 bytes of the hash of the key, in reverse order.

use md5::Md5;
use sha1::{Digest, Sha1};

use crate::{file::io::read_le, metadata::tables::AssemblyHashAlgorithm, Result};

/// The 16 byte ECMA standard public key, used by framework assemblies in place of a real key
pub const ECMA_PUBLIC_KEY: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];

/// The cryptographic part of an assembly identity.
///
/// Tokens are stored as `u64` such that `token.to_le_bytes()` yields the bytes in display
/// order, the same order in which they appear in `AssemblyRef` blobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// The full public key
    PubKey(Vec<u8>),
    /// Public key token
    Token(u64),
    /// The ECMA standard key placeholder
    EcmaKey(Vec<u8>),
}

impl Identity {
    /// Create an `Identity` from a key or token blob.
    ///
    /// # Arguments
    /// * `data`    - The blob contents
    /// * `is_pub`  - `true` for a full public key, `false` for a token
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if a token blob is shorter than 8 bytes.
    pub fn from(data: &[u8], is_pub: bool) -> Result<Self> {
        Ok(if is_pub {
            if data == ECMA_PUBLIC_KEY {
                Identity::EcmaKey(data.to_vec())
            } else {
                Identity::PubKey(data.to_vec())
            }
        } else {
            Identity::Token(read_le::<u64>(data)?)
        })
    }

    /// Get the public key token, hashing the key with `algo` if needed.
    ///
    /// # Arguments
    /// * `algo` - An `AssemblyHashAlgorithm` value; `NONE` selects SHA-1
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for an unknown hash algorithm.
    pub fn to_token(&self, algo: u32) -> Result<u64> {
        let data = match self {
            Identity::Token(token) => return Ok(*token),
            Identity::PubKey(data) | Identity::EcmaKey(data) => data,
        };

        let mut tail = match algo {
            AssemblyHashAlgorithm::MD5 => {
                let hash = Md5::digest(data);
                hash[hash.len() - 8..].to_vec()
            }
            AssemblyHashAlgorithm::SHA1 | AssemblyHashAlgorithm::NONE => {
                let hash = Sha1::digest(data);
                hash[hash.len() - 8..].to_vec()
            }
            _ => return Err(crate::Error::NotSupported),
        };

        tail.reverse();
        read_le::<u64>(&tail)
    }

    /// The SHA-1 public key token.
    ///
    /// # Errors
    /// Never fails for SHA-1; the `Result` mirrors [`Identity::to_token`].
    pub fn token(&self) -> Result<u64> {
        self.to_token(AssemblyHashAlgorithm::SHA1)
    }
}

/// Format a token as 16 lowercase hex digits in display order.
#[must_use]
pub fn token_to_hex(token: u64) -> String {
    hex::encode(token.to_le_bytes())
}

/// Parse 16 hex digits in display order into a token.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for invalid hex or a length other than 8 bytes.
pub fn token_from_hex(value: &str) -> Result<u64> {
    let bytes = hex::decode(value)
        .map_err(|e| malformed_error!("Invalid hex in PublicKeyToken '{}': {}", value, e))?;

    let Ok(bytes) = <[u8; 8]>::try_from(bytes.as_slice()) else {
        return Err(malformed_error!(
            "PublicKeyToken must be exactly 8 bytes, got {} from '{}'",
            bytes.len(),
            value
        ));
    };

    Ok(u64::from_le_bytes(bytes))
}
