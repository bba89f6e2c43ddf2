//! Site enrollment for the WPDash child agent.
//!
//! A dashboard enrolls a site by sending it a public key. This crate turns
//! that key into a canonical OpenSSH public key labelled with the site's
//! identity and keeps it in durable storage:
//!
//! - Identity derivation from the site URL (`wpdash@example.com`)
//! - Key conversion (PEM / DER / OpenSSH / SSH wire → OpenSSH line)
//! - Registration with a pluggable authorization policy
//! - Read path for the settings screen, manual regeneration, security ID
//! - Memory and JSON-file key stores
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wpdash_enroll::{Enrollment, MemoryStore, OpenRegistration, RegistrationRequest, SiteContext};
//!
//! # async fn example(pem: String) -> Result<(), wpdash_enroll::RegistrationError> {
//! let enrollment = Enrollment::new(
//!     SiteContext::new("https://www.example.com/"),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(OpenRegistration),
//! );
//!
//! let artifact = enrollment
//!     .register(&RegistrationRequest::new(pem, "dashboard-1"))
//!     .await?;
//! assert_eq!(artifact.comment, "wpdash@example.com");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! See [`config`] for the `WPDASH_*` environment variables.

pub mod auth;
pub mod config;
pub mod convert;
pub mod enroll;
pub mod error;
pub mod identity;
pub mod request;
pub mod secret;
pub mod store;
pub mod types;

// Re-export main types
pub use auth::{authorizer_for, Authorizer, BootstrapToken, OpenRegistration, SecurityIdMatch};
pub use config::{AuthMode, EnrollConfig};
pub use convert::{convert, decode_transport, encode_transport, parse_public_key};
pub use enroll::Enrollment;
pub use error::{ConversionError, EnrollResult, RegistrationError, StoreError, StoreResult};
pub use identity::{derive_identity, ROLE_TAG};
pub use request::{handle, InboundCall, Outcome};
pub use secret::{generate_pairing_secret, SECRET_LEN};
pub use store::{FileStore, KeyStore, MemoryStore, PUBLIC_KEY, SECURITY_ID, SSH_KEY, SSH_TIME};
pub use types::{ConnectionStatus, KeyArtifact, RegistrationRequest, SiteContext};
