//! Public key conversion.
//!
//! Turns a transport-encoded key blob into the canonical artifact handed to
//! the controller:
//!
//! ```text
//! base64(key material) -> parse -> "ssh-<alg> <blob> wpdash@<site>" -> base64
//! ```
//!
//! Accepted key material:
//!
//! | Form | Algorithms |
//! |------|------------|
//! | PEM `PUBLIC KEY` (SPKI) | Ed25519, RSA |
//! | PEM `RSA PUBLIC KEY` (PKCS#1) | RSA |
//! | OpenSSH line | anything `ssh-key` parses (Ed25519, RSA, ECDSA) |
//! | DER SPKI / DER PKCS#1 | Ed25519, RSA |
//! | SSH wire-format blob | anything `ssh-key` parses |
//!
//! Conversion never touches storage.

use chrono::{SubsecRound, Utc};
use ssh_key::PublicKey;
use tracing::debug;

use crate::error::ConversionError;
use crate::types::KeyArtifact;

#[path = "convert_next/mod.rs"]
mod convert_next;

/// Convert a transport-encoded key blob into a labelled OpenSSH artifact.
///
/// Deterministic in `(transport_blob, identity)` apart from `created_at`.
pub fn convert(transport_blob: &[u8], identity: &str) -> Result<KeyArtifact, ConversionError> {
    let raw = decode_transport(transport_blob)?;
    let mut key = parse_public_key(&raw)?;
    key.set_comment(identity);

    let line = key.to_openssh().map_err(|e| ConversionError::Encode {
        reason: e.to_string(),
    })?;

    debug!(
        algorithm = %key.algorithm(),
        comment = identity,
        "converted public key to OpenSSH"
    );

    Ok(KeyArtifact {
        encoded_key: encode_transport(line.as_bytes()),
        comment: identity.to_string(),
        created_at: Utc::now().trunc_subsecs(0),
    })
}

/// Remove the transport layer (standard base64, whitespace ignored).
pub fn decode_transport(blob: &[u8]) -> Result<Vec<u8>, ConversionError> {
    convert_next::transport::decode_impl(blob)
}

/// Apply the transport layer.
pub fn encode_transport(bytes: &[u8]) -> String {
    convert_next::transport::encode_impl(bytes)
}

/// Parse raw key material in any supported form.
///
/// Any comment carried by an OpenSSH line is kept; [`convert`] replaces it.
pub fn parse_public_key(raw: &[u8]) -> Result<PublicKey, ConversionError> {
    convert_next::parse::parse_impl(raw)
}
