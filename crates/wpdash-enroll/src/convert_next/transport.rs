//! Transport layer: the printable base64 wrapper around binary key material.

use base64::{
    engine::general_purpose::{STANDARD as BASE64, STANDARD_NO_PAD},
    Engine,
};

use crate::error::ConversionError;

pub(crate) fn decode_impl(blob: &[u8]) -> Result<Vec<u8>, ConversionError> {
    let compact: Vec<u8> = blob
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    BASE64
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .map_err(|e| ConversionError::Transport {
            reason: format!("invalid base64: {}", e),
        })
}

pub(crate) fn encode_impl(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}
