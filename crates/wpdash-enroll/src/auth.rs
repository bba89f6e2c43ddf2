//! Registration authorization.
//!
//! Registration itself only checks that a key and a server identifier are
//! present. Deployments put one of these policies in front of it:
//!
//! - [`OpenRegistration`]: accept everything (legacy behaviour, logs a warning)
//! - [`BootstrapToken`]: the request must carry a pre-shared token
//! - [`SecurityIdMatch`]: once a security ID exists the request must carry it
//!
//! # Configuration
//!
//! ```yaml
//! auth: security-id        # open | token | security-id
//! require_security_id: true
//! bootstrap_token: "..."   # only for `token`
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::{AuthMode, EnrollConfig};
use crate::error::{EnrollResult, RegistrationError};
use crate::store::{KeyStore, SECURITY_ID};
use crate::types::RegistrationRequest;

/// Decides whether a registration request may proceed.
#[async_trait]
pub trait Authorizer: Send + Sync + std::fmt::Debug {
    /// Return `Err(RegistrationError::Unauthorized)` to reject.
    async fn authorize(
        &self,
        request: &RegistrationRequest,
        store: &dyn KeyStore,
    ) -> EnrollResult<()>;
}

/// Accepts every request.
#[derive(Debug, Clone, Default)]
pub struct OpenRegistration;

#[async_trait]
impl Authorizer for OpenRegistration {
    async fn authorize(
        &self,
        request: &RegistrationRequest,
        _store: &dyn KeyStore,
    ) -> EnrollResult<()> {
        warn!(
            server = %request.server_identifier,
            "accepting unauthenticated registration"
        );
        Ok(())
    }
}

/// Requires the request credential to equal a pre-shared token.
#[derive(Clone)]
pub struct BootstrapToken {
    token: String,
}

impl BootstrapToken {
    pub fn new(token: impl Into<String>) -> EnrollResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(RegistrationError::Config {
                message: "bootstrap token must not be empty".into(),
            });
        }
        Ok(Self { token })
    }
}

impl std::fmt::Debug for BootstrapToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authorizer for BootstrapToken {
    async fn authorize(
        &self,
        request: &RegistrationRequest,
        _store: &dyn KeyStore,
    ) -> EnrollResult<()> {
        match request.credential.as_deref() {
            Some(presented) if secrets_match(presented, &self.token) => Ok(()),
            Some(_) => Err(RegistrationError::Unauthorized {
                reason: "bootstrap token mismatch".into(),
            }),
            None => Err(RegistrationError::Unauthorized {
                reason: "bootstrap token required".into(),
            }),
        }
    }
}

/// Requires the request credential to equal the stored security ID.
///
/// Without a stored security ID (an empty value counts as none) the request
/// passes unless `required` is set.
#[derive(Debug, Clone, Default)]
pub struct SecurityIdMatch {
    pub required: bool,
}

impl SecurityIdMatch {
    pub fn new(required: bool) -> Self {
        Self { required }
    }
}

#[async_trait]
impl Authorizer for SecurityIdMatch {
    async fn authorize(
        &self,
        request: &RegistrationRequest,
        store: &dyn KeyStore,
    ) -> EnrollResult<()> {
        let stored = store.get(SECURITY_ID).await?.filter(|v| !v.is_empty());

        match (stored, request.credential.as_deref()) {
            (Some(expected), Some(presented)) if secrets_match(presented, &expected) => Ok(()),
            (Some(_), Some(_)) => Err(RegistrationError::Unauthorized {
                reason: "security ID mismatch".into(),
            }),
            (Some(_), None) => Err(RegistrationError::Unauthorized {
                reason: "security ID required".into(),
            }),
            (None, _) if self.required => Err(RegistrationError::Unauthorized {
                reason: "no security ID configured on this site".into(),
            }),
            (None, _) => Ok(()),
        }
    }
}

/// Build the policy selected by the configuration.
pub fn authorizer_for(config: &EnrollConfig) -> EnrollResult<Arc<dyn Authorizer>> {
    match config.auth {
        AuthMode::Open => Ok(Arc::new(OpenRegistration)),
        AuthMode::Token => {
            let token = config
                .bootstrap_token
                .clone()
                .ok_or_else(|| RegistrationError::Config {
                    message: "auth mode 'token' needs bootstrap_token".into(),
                })?;
            Ok(Arc::new(BootstrapToken::new(token)?))
        }
        AuthMode::SecurityId => Ok(Arc::new(SecurityIdMatch::new(config.require_security_id))),
    }
}

/// Compare through digests so timing does not depend on the common prefix.
fn secrets_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
