//! Inbound request parameters.
//!
//! The transport (HTTP in a WordPress install) hands over a flat parameter
//! set. Two functions are recognized:
//!
//! | `function` | Parameters | Effect |
//! |------------|------------|--------|
//! | `register` | `pubkey`, `server`, optional `security_id` | [`Enrollment::register`] |
//! | `generate_manual` | none | [`Enrollment::regenerate`] |
//!
//! Anything else is ignored. `pubkey` may be raw key text (PEM or OpenSSH)
//! or its base64 transport form.

use std::collections::HashMap;

use tracing::debug;

use crate::convert::{decode_transport, parse_public_key};
use crate::enroll::Enrollment;
use crate::error::EnrollResult;
use crate::types::{KeyArtifact, RegistrationRequest};

pub const FUNCTION_REGISTER: &str = "register";
pub const FUNCTION_GENERATE_MANUAL: &str = "generate_manual";

/// Parsed inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCall {
    Register(RegistrationRequest),
    GenerateManual,
    Ignored,
}

/// Result of handling an inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Registered(KeyArtifact),
    Regenerated(KeyArtifact),
    Ignored,
}

impl InboundCall {
    /// Parse a URL-encoded query or form body.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_params(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// Build from decoded name/value pairs. Later duplicates win.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params: HashMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        match params.get("function").map(String::as_str) {
            Some(FUNCTION_REGISTER) => {
                let candidate_key = params
                    .get("pubkey")
                    .map(|v| decode_pubkey_param(v))
                    .unwrap_or_default();
                let server_identifier = params.get("server").cloned().unwrap_or_default();
                let credential = params.get("security_id").filter(|v| !v.is_empty()).cloned();

                Self::Register(RegistrationRequest {
                    candidate_key,
                    server_identifier,
                    credential,
                })
            }
            Some(FUNCTION_GENERATE_MANUAL) => Self::GenerateManual,
            other => {
                debug!(function = ?other, "ignoring inbound call");
                Self::Ignored
            }
        }
    }
}

/// Dispatch a parsed call to the enrollment service.
pub async fn handle(enrollment: &Enrollment, call: InboundCall) -> EnrollResult<Outcome> {
    match call {
        InboundCall::Register(request) => enrollment
            .register(&request)
            .await
            .map(Outcome::Registered),
        InboundCall::GenerateManual => enrollment.regenerate().await.map(Outcome::Regenerated),
        InboundCall::Ignored => Ok(Outcome::Ignored),
    }
}

/// Recover raw key material from the `pubkey` parameter.
///
/// Raw key text is kept as is. Otherwise the value is treated as base64,
/// with spaces read as `+` (an unescaped `+` decodes to a space in form
/// data). Values that are neither are passed through for the converter to
/// reject.
pub fn decode_pubkey_param(value: &str) -> Vec<u8> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if parse_public_key(trimmed.as_bytes()).is_ok() {
        return trimmed.as_bytes().to_vec();
    }

    match decode_transport(trimmed.replace(' ', "+").as_bytes()) {
        Ok(decoded) if !decoded.is_empty() => decoded,
        _ => trimmed.as_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::encode_transport;

    const OPENSSH: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIC1jR8Vr186BEZfrKd7WcXUBBOBQrBxG0FTlpI+38ult";

    #[test]
    fn test_register_query() {
        let query = format!(
            "function=register&pubkey={}&server=dash-1&security_id=abc",
            url::form_urlencoded::byte_serialize(OPENSSH.as_bytes()).collect::<String>()
        );
        let call = InboundCall::from_query(&query);
        assert_eq!(
            call,
            InboundCall::Register(
                RegistrationRequest::new(OPENSSH, "dash-1").with_credential("abc")
            )
        );
    }

    #[test]
    fn test_register_missing_fields_still_parse() {
        let call = InboundCall::from_query("?function=register");
        assert_eq!(call, InboundCall::Register(RegistrationRequest::default()));
    }

    #[test]
    fn test_other_functions() {
        assert_eq!(
            InboundCall::from_query("function=generate_manual&page=wpdash_child_tab"),
            InboundCall::GenerateManual
        );
        assert_eq!(InboundCall::from_query("function=sync"), InboundCall::Ignored);
        assert_eq!(InboundCall::from_query(""), InboundCall::Ignored);
    }

    #[test]
    fn test_pubkey_param_forms() {
        assert_eq!(decode_pubkey_param(OPENSSH), OPENSSH.as_bytes());

        let b64 = encode_transport(OPENSSH.as_bytes());
        assert_eq!(decode_pubkey_param(&b64), OPENSSH.as_bytes());
        assert_eq!(
            decode_pubkey_param(&b64.replace('+', " ")),
            OPENSSH.as_bytes()
        );

        assert_eq!(decode_pubkey_param("   "), Vec::<u8>::new());
        assert_eq!(decode_pubkey_param("@@@"), b"@@@".to_vec());
    }
}
