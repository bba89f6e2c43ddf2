//! Site enrollment service.
//!
//! Ties identity derivation, key conversion, the registration policy and the
//! key store together. Every mutation goes through one write lock per
//! enrollment and lands in the store as a single atomic batch, so readers
//! never see a new artifact paired with a stale timestamp.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{authorizer_for, Authorizer};
use crate::config::EnrollConfig;
use crate::convert::{convert, encode_transport};
use crate::error::{EnrollResult, RegistrationError, StoreError};
use crate::identity::derive_identity;
use crate::secret::generate_pairing_secret;
use crate::store::{FileStore, KeyStore, PUBLIC_KEY, SECURITY_ID, SSH_KEY, SSH_TIME};
use crate::types::{ConnectionStatus, KeyArtifact, RegistrationRequest, SiteContext};

/// Enrollment service for one site.
///
/// Cheap to clone; clones share the store, the policy and the write lock.
#[derive(Debug, Clone)]
pub struct Enrollment {
    site: SiteContext,
    store: Arc<dyn KeyStore>,
    authorizer: Arc<dyn Authorizer>,
    write_lock: Arc<Mutex<()>>,
}

impl Enrollment {
    /// Create a service over explicit collaborators.
    pub fn new(
        site: SiteContext,
        store: Arc<dyn KeyStore>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            site,
            store,
            authorizer,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a service backed by a [`FileStore`] as configured.
    pub fn from_config(config: &EnrollConfig) -> EnrollResult<Self> {
        let store = match &config.store_path {
            Some(path) => FileStore::with_path(path),
            None => FileStore::new()?,
        };
        debug!(path = %store.path().display(), "using file store");

        Ok(Self::new(
            config.site(),
            Arc::new(store),
            authorizer_for(config)?,
        ))
    }

    /// Site this service enrolls.
    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    /// Identity for the current site URL.
    pub fn identity(&self) -> String {
        derive_identity(&self.site.site_url)
    }

    /// Register a controller-supplied public key.
    ///
    /// Checks, in order: key present, server identifier present, policy.
    /// Nothing is written unless conversion succeeds; then the original key,
    /// the artifact and its timestamp are stored as one batch.
    pub async fn register(&self, request: &RegistrationRequest) -> EnrollResult<KeyArtifact> {
        if request.candidate_key.is_empty() {
            return Err(RegistrationError::MissingField { field: "pubkey" });
        }
        if request.server_identifier.trim().is_empty() {
            return Err(RegistrationError::MissingField { field: "server" });
        }

        if let Err(e) = self
            .authorizer
            .authorize(request, self.store.as_ref())
            .await
        {
            warn!(
                server = %request.server_identifier,
                error = %e,
                "registration rejected"
            );
            return Err(e);
        }

        let identity = self.identity();
        let original = encode_transport(&request.candidate_key);
        let artifact = convert(original.as_bytes(), &identity).map_err(|e| {
            warn!(
                server = %request.server_identifier,
                error = %e,
                "registration key could not be converted"
            );
            RegistrationError::from(e)
        })?;

        let _guard = self.write_lock.lock().await;
        let timestamp = artifact.timestamp();
        self.store
            .set_all(&[
                (PUBLIC_KEY, original.as_str()),
                (SSH_KEY, artifact.encoded_key.as_str()),
                (SSH_TIME, timestamp.as_str()),
            ])
            .await?;

        info!(
            server = %request.server_identifier,
            identity = %identity,
            fingerprint = %artifact.fingerprint().unwrap_or_default(),
            "site registered"
        );
        Ok(artifact)
    }

    /// Rebuild the artifact from the stored original key with the current
    /// identity and store it. The original key is left untouched.
    pub async fn regenerate(&self) -> EnrollResult<KeyArtifact> {
        let _guard = self.write_lock.lock().await;

        let artifact = self.convert_stored().await?;
        let timestamp = artifact.timestamp();
        self.store
            .set_all(&[
                (SSH_KEY, artifact.encoded_key.as_str()),
                (SSH_TIME, timestamp.as_str()),
            ])
            .await?;

        info!(identity = %artifact.comment, "key artifact regenerated");
        Ok(artifact)
    }

    /// What [`Enrollment::regenerate`] would store, without storing it.
    pub async fn preview(&self) -> EnrollResult<KeyArtifact> {
        self.convert_stored().await
    }

    async fn convert_stored(&self) -> EnrollResult<KeyArtifact> {
        let original = self
            .store
            .get(PUBLIC_KEY)
            .await?
            .filter(|v| !v.is_empty())
            .ok_or(RegistrationError::NotRegistered)?;

        Ok(convert(original.as_bytes(), &self.identity())?)
    }

    /// Current artifact, if the site has been registered.
    ///
    /// A half-written pair (artifact without timestamp or the reverse) is
    /// reported as absent.
    pub async fn current_artifact(&self) -> EnrollResult<Option<KeyArtifact>> {
        let [key, time] = self.read_many([SSH_KEY, SSH_TIME]).await?;
        artifact_from_pair(key.as_deref(), time.as_deref())
    }

    /// Current pairing secret, if generated.
    pub async fn current_pairing_secret(&self) -> EnrollResult<Option<String>> {
        Ok(self.store.get(SECURITY_ID).await?.filter(|v| !v.is_empty()))
    }

    /// Return the pairing secret, generating and storing one if none exists.
    ///
    /// Concurrent callers all receive the single stored value.
    pub async fn generate_pairing_secret_if_absent(&self) -> EnrollResult<String> {
        if let Some(existing) = self.current_pairing_secret().await? {
            return Ok(existing);
        }

        let candidate = generate_pairing_secret();
        let stored = self.store.set_if_absent(SECURITY_ID, &candidate).await?;
        if stored == candidate {
            info!("security ID generated");
        }
        Ok(stored)
    }

    /// Whether a controller key has been registered.
    pub async fn is_connected(&self) -> EnrollResult<bool> {
        Ok(self
            .store
            .get(PUBLIC_KEY)
            .await?
            .is_some_and(|v| !v.is_empty()))
    }

    /// Everything the settings screen shows, from one store snapshot.
    pub async fn status(&self) -> EnrollResult<ConnectionStatus> {
        let [original, key, time, security_id] = self
            .read_many([PUBLIC_KEY, SSH_KEY, SSH_TIME, SECURITY_ID])
            .await?;

        let connected = original.is_some_and(|v| !v.is_empty());
        let security_id = security_id.filter(|v| !v.is_empty());
        let artifact = artifact_from_pair(key.as_deref(), time.as_deref())?;

        let ssh_key = match &artifact {
            Some(artifact) => Some(artifact.openssh_text()?),
            None => None,
        };

        Ok(ConnectionStatus {
            identity: self.identity(),
            connected,
            can_regenerate: connected && security_id.is_some(),
            security_id,
            ssh_key,
            last_sync: artifact.map(|a| a.created_at),
        })
    }

    /// One consistent snapshot of `keys`, in order.
    async fn read_many<const N: usize>(
        &self,
        keys: [&str; N],
    ) -> EnrollResult<[Option<String>; N]> {
        let values = self.store.get_all(&keys).await?;
        let got = values.len();
        <[Option<String>; N]>::try_from(values).map_err(|_| {
            RegistrationError::from(StoreError::Corrupt {
                message: format!("store returned {} values for {} keys", got, N),
            })
        })
    }
}

fn artifact_from_pair(
    encoded_key: Option<&str>,
    timestamp: Option<&str>,
) -> EnrollResult<Option<KeyArtifact>> {
    match (encoded_key, timestamp) {
        (Some(key), Some(time)) if !key.is_empty() && !time.is_empty() => {
            KeyArtifact::from_stored(key, time).map(Some)
        }
        (None, None) => Ok(None),
        (key, time) => {
            warn!(
                has_key = key.is_some_and(|v| !v.is_empty()),
                has_time = time.is_some_and(|v| !v.is_empty()),
                "incomplete key artifact in store, treating as absent"
            );
            Ok(None)
        }
    }
}
