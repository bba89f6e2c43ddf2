//! Pairing secret ("security ID") generation.

use rand::distributions::{Alphanumeric, DistString};

/// Length of a generated pairing secret.
pub const SECRET_LEN: usize = 12;

/// Generate a fresh pairing secret from `[A-Za-z0-9]`.
///
/// Uses the thread-local CSPRNG.
pub fn generate_pairing_secret() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), SECRET_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_shape() {
        let secret = generate_pairing_secret();
        assert_eq!(secret.len(), SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_secrets_differ() {
        let a = generate_pairing_secret();
        let b = generate_pairing_secret();
        assert_ne!(a, b);
    }
}
