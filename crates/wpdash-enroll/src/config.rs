//! Enrollment configuration.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `WPDASH_SITE_URL` | Public base URL of the site (default: `wordpress`) |
//! | `WPDASH_STORE_PATH` | Path of the JSON option store |
//! | `WPDASH_AUTH` | Registration policy: `open`, `token`, `security-id` |
//! | `WPDASH_BOOTSTRAP_TOKEN` | Pre-shared token for `token` policy |
//! | `WPDASH_REQUIRE_SECURITY_ID` | Reject registration until a security ID exists |

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EnrollResult, RegistrationError};
use crate::types::SiteContext;

/// Registration policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// No credential check.
    Open,
    /// Pre-shared bootstrap token.
    Token,
    /// Stored security ID must match once generated.
    #[default]
    SecurityId,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "token" => Ok(Self::Token),
            "security-id" | "security_id" => Ok(Self::SecurityId),
            other => Err(format!(
                "unknown auth mode '{}' (expected open, token or security-id)",
                other
            )),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Token => "token",
            Self::SecurityId => "security-id",
        })
    }
}

/// Enrollment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollConfig {
    /// Public base URL of the site.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Option store path (default: `<data dir>/wpdash/child-options.json`).
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Registration policy.
    #[serde(default)]
    pub auth: AuthMode,

    /// Token for [`AuthMode::Token`].
    #[serde(default)]
    pub bootstrap_token: Option<String>,

    /// For [`AuthMode::SecurityId`]: reject until a security ID exists.
    #[serde(default)]
    pub require_security_id: bool,
}

fn default_site_url() -> String {
    "wordpress".to_string()
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            store_path: None,
            auth: AuthMode::default(),
            bootstrap_token: None,
            require_security_id: false,
        }
    }
}

impl EnrollConfig {
    /// Create config from environment variables on top of the defaults.
    pub fn from_env() -> EnrollResult<Self> {
        Self::default().merge_env()
    }

    /// Load a YAML file. Missing fields take their defaults.
    pub fn from_yaml_file(path: &Path) -> EnrollResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistrationError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML.
    pub fn from_yaml_str(content: &str) -> EnrollResult<Self> {
        serde_yaml::from_str(content).map_err(|e| RegistrationError::Config {
            message: format!("invalid config: {}", e),
        })
    }

    /// Override fields with any `WPDASH_*` variables that are set.
    pub fn merge_env(mut self) -> EnrollResult<Self> {
        if let Some(url) = env_non_empty("WPDASH_SITE_URL") {
            self.site_url = url;
        }
        if let Some(path) = env_non_empty("WPDASH_STORE_PATH") {
            self.store_path = Some(PathBuf::from(path));
        }
        if let Some(mode) = env_non_empty("WPDASH_AUTH") {
            self.auth = mode
                .parse()
                .map_err(|message| RegistrationError::Config { message })?;
        }
        if let Some(token) = env_non_empty("WPDASH_BOOTSTRAP_TOKEN") {
            self.bootstrap_token = Some(token);
        }
        if let Some(flag) = env_non_empty("WPDASH_REQUIRE_SECURITY_ID") {
            self.require_security_id = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        Ok(self)
    }

    /// Site facts handed to the enrollment service.
    pub fn site(&self) -> SiteContext {
        SiteContext::new(self.site_url.clone())
    }

    /// Set the site URL.
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = url.into();
        self
    }

    /// Set the store path.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the registration policy.
    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Set the bootstrap token.
    pub fn with_bootstrap_token(mut self, token: impl Into<String>) -> Self {
        self.bootstrap_token = Some(token.into());
        self
    }

    /// Require a security ID before accepting registrations.
    pub fn with_require_security_id(mut self, require: bool) -> Self {
        self.require_security_id = require;
        self
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnrollConfig::default();
        assert_eq!(config.site_url, "wordpress");
        assert_eq!(config.auth, AuthMode::SecurityId);
        assert!(!config.require_security_id);
        assert_eq!(config.site().site_url, "wordpress");
    }

    #[test]
    fn test_yaml_partial() {
        let config = EnrollConfig::from_yaml_str(
            "site_url: https://www.example.com/\nauth: token\nbootstrap_token: abc\n",
        )
        .unwrap();
        assert_eq!(config.site_url, "https://www.example.com/");
        assert_eq!(config.auth, AuthMode::Token);
        assert_eq!(config.bootstrap_token.as_deref(), Some("abc"));
        assert_eq!(config.store_path, None);
    }

    #[test]
    fn test_yaml_rejects_unknown_mode() {
        let result = EnrollConfig::from_yaml_str("auth: trust-me\n");
        assert!(matches!(result, Err(RegistrationError::Config { .. })));
    }

    #[test]
    fn test_auth_mode_parse_and_display() {
        for mode in [AuthMode::Open, AuthMode::Token, AuthMode::SecurityId] {
            assert_eq!(mode.to_string().parse::<AuthMode>().unwrap(), mode);
        }
        assert_eq!("Security_ID".parse::<AuthMode>().unwrap(), AuthMode::SecurityId);
        assert!("nope".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_builders() {
        let config = EnrollConfig::default()
            .with_site_url("https://example.com")
            .with_store_path("/tmp/options.json")
            .with_auth(AuthMode::Open)
            .with_require_security_id(true);
        assert_eq!(config.site_url, "https://example.com");
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/options.json")));
        assert_eq!(config.auth, AuthMode::Open);
        assert!(config.require_security_id);
    }
}
