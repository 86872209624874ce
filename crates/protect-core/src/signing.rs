//! Relay request authentication.
//!
//! The relay identifies callers by an Ethereum address and expects each request
//! to carry an `X-Flashbots-Signature: <address>:<signature>` header, where the
//! signature is an EIP-191 personal-sign over the string `0x` +
//! hex(keccak256(body)).
//!
//! The private key never leaves [`RelaySigner`]: `Debug` prints only the
//! derived address and there is no `Serialize` impl.

use k256::{
    ecdsa::{SigningKey, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey,
};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;

/// Header carrying the relay signature.
pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("signing key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("signing key must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("signing key is not a valid secp256k1 scalar")]
    InvalidKey,

    #[error("signing failed")]
    Signing,
}

#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// EIP-191 hash of `message` ("\x19Ethereum Signed Message:\n" + len + message).
#[must_use]
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Lower-case `0x`-prefixed Ethereum address of `key`.
#[must_use]
pub fn address_of(key: &VerifyingKey) -> String {
    let point = PublicKey::from(key).to_encoded_point(false);
    // Uncompressed SEC1: 0x04 || X || Y; the address is the last 20 bytes of keccak(X || Y).
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

pub struct RelaySigner {
    key: SigningKey,
    address: String,
}

impl fmt::Debug for RelaySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySigner").field("address", &self.address).finish_non_exhaustive()
    }
}

impl RelaySigner {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// Parses a hex private key, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError`] if the input is not 32 bytes of hex or is not a
    /// valid secp256k1 scalar.
    pub fn from_hex(input: &str) -> Result<Self, SignerError> {
        let trimmed = input.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 32 {
            return Err(SignerError::InvalidLength(bytes.len()));
        }
        let key = SigningKey::from_slice(&bytes).map_err(|_| SignerError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// Generates a fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut rand::rngs::OsRng))
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }

    /// Hex of the private key, `0x`-prefixed. Only the CLI key generator calls this.
    #[must_use]
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.to_bytes()))
    }

    /// Signs `message` as an EIP-191 personal message.
    ///
    /// Returns the 65-byte `r || s || v` signature with `v` in `{0, 1}`.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if the underlying ECDSA operation fails.
    pub fn sign_personal_message(&self, message: &[u8]) -> Result<[u8; 65], SignerError> {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) =
            self.key.sign_prehash_recoverable(&digest).map_err(|_| SignerError::Signing)?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(out)
    }

    /// Builds the value of [`SIGNATURE_HEADER`] for a request body.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if signing fails.
    pub fn signature_header(&self, body: &[u8]) -> Result<String, SignerError> {
        let body_hash = format!("0x{}", hex::encode(keccak256(body)));
        let signature = self.sign_personal_message(body_hash.as_bytes())?;
        Ok(format!("{}:0x{}", self.address, hex::encode(signature)))
    }
}
