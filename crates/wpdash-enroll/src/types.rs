//! Enrollment data types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use ssh_key::{HashAlg, PublicKey};

use crate::convert::{decode_transport, parse_public_key};
use crate::error::{ConversionError, EnrollResult, RegistrationError};
use crate::store::{SSH_KEY, SSH_TIME};

/// Persisted timestamp format (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format for the last sync time.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Inbound registration request.
///
/// Built per call and discarded afterwards; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRequest {
    /// Raw key material as submitted, before transport encoding.
    pub candidate_key: Vec<u8>,

    /// Requesting controller instance. Only checked for non-emptiness.
    pub server_identifier: String,

    /// Optional proof presented to the registration policy.
    pub credential: Option<String>,
}

impl RegistrationRequest {
    /// Create a request without a credential.
    pub fn new(candidate_key: impl Into<Vec<u8>>, server_identifier: impl Into<String>) -> Self {
        Self {
            candidate_key: candidate_key.into(),
            server_identifier: server_identifier.into(),
            credential: None,
        }
    }

    /// Attach a credential (bootstrap token or security ID).
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

/// Canonical, labelled public key derived for the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyArtifact {
    /// Base64 of the single-line OpenSSH public key text.
    pub encoded_key: String,

    /// Identity embedded as the key comment.
    pub comment: String,

    /// When the conversion happened.
    pub created_at: DateTime<Utc>,
}

impl KeyArtifact {
    /// Rebuild an artifact from its persisted pair.
    ///
    /// The comment is recovered from the key text itself.
    pub fn from_stored(encoded_key: &str, timestamp: &str) -> EnrollResult<Self> {
        let created_at =
            parse_timestamp(timestamp).ok_or_else(|| RegistrationError::CorruptEntry {
                key: SSH_TIME.to_string(),
                reason: format!("invalid timestamp '{}'", timestamp),
            })?;

        let key = decode_transport(encoded_key.as_bytes())
            .and_then(|bytes| parse_public_key(&bytes))
            .map_err(|e| RegistrationError::CorruptEntry {
                key: SSH_KEY.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            encoded_key: encoded_key.to_string(),
            comment: key.comment().to_string(),
            created_at,
        })
    }

    /// The OpenSSH public key line (`ssh-ed25519 AAAA... wpdash@example.com`).
    pub fn openssh_text(&self) -> Result<String, ConversionError> {
        let bytes = decode_transport(self.encoded_key.as_bytes())?;
        String::from_utf8(bytes).map_err(|e| ConversionError::Transport {
            reason: format!("artifact is not UTF-8: {}", e),
        })
    }

    /// Parse the artifact back into a public key.
    pub fn public_key(&self) -> Result<PublicKey, ConversionError> {
        parse_public_key(&decode_transport(self.encoded_key.as_bytes())?)
    }

    /// SHA-256 fingerprint (`SHA256:...`).
    pub fn fingerprint(&self) -> Result<String, ConversionError> {
        Ok(self.public_key()?.fingerprint(HashAlg::Sha256).to_string())
    }

    /// Persisted form of `created_at`.
    pub fn timestamp(&self) -> String {
        format_timestamp(&self.created_at)
    }

    /// `created_at` as shown next to the key (`DD/MM/YYYY HH:MM:SS`).
    pub fn last_sync(&self) -> String {
        self.created_at.format(DISPLAY_FORMAT).to_string()
    }
}

/// Site facts injected into the enrollment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContext {
    /// Public base URL of the site.
    pub site_url: String,
}

impl SiteContext {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
        }
    }
}

/// What the settings screen shows about the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// Derived identity for the current site URL.
    pub identity: String,

    /// An original key has been registered.
    pub connected: bool,

    /// Pairing secret, if generated.
    pub security_id: Option<String>,

    /// Decoded OpenSSH line of the current artifact.
    pub ssh_key: Option<String>,

    /// When the current artifact was produced.
    pub last_sync: Option<DateTime<Utc>>,

    /// Manual regeneration is offered (original key and security ID present).
    pub can_regenerate: bool,
}

pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_roundtrip_drops_subseconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-09 07:05:01");
        assert_eq!(parse_timestamp("2024-03-09 07:05:01"), Some(at));
        assert_eq!(parse_timestamp("09/03/2024"), None);
    }

    #[test]
    fn test_request_builder() {
        let req = RegistrationRequest::new(b"key".to_vec(), "dash-1").with_credential("abc");
        assert_eq!(req.candidate_key, b"key");
        assert_eq!(req.server_identifier, "dash-1");
        assert_eq!(req.credential.as_deref(), Some("abc"));
    }
}
