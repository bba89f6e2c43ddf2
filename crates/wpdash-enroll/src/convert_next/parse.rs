//! Key material parsing into `ssh_key::PublicKey`.

use ed25519_dalek::VerifyingKey;
use pkcs8::der::{pem, Decode};
use pkcs8::spki::SubjectPublicKeyInfoRef;
use pkcs8::{DecodePublicKey, ObjectIdentifier};
use rsa::pkcs1::RsaPublicKey as Pkcs1RsaPublicKey;
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use ssh_key::public::{Ed25519PublicKey, KeyData, RsaPublicKey};
use ssh_key::{Mpint, PublicKey};

use crate::error::ConversionError;

const PEM_SPKI: &str = "PUBLIC KEY";
const PEM_PKCS1: &str = "RSA PUBLIC KEY";

/// First tokens of an OpenSSH public key line.
const OPENSSH_PREFIXES: [&str; 3] = ["ssh-", "ecdsa-sha2-", "sk-"];

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Largest RSA modulus accepted, in bits. OpenSSH's own limit.
const RSA_MAX_BITS: usize = 16384;

pub(crate) fn parse_impl(raw: &[u8]) -> Result<PublicKey, ConversionError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(malformed("empty key material"));
    }

    if let Ok(text) = std::str::from_utf8(raw) {
        let text = text.trim();

        if let Some(label) = pem_label(text) {
            return parse_pem(label, &text.replace("\r\n", "\n"));
        }

        if OPENSSH_PREFIXES.iter().any(|p| text.starts_with(p)) {
            return PublicKey::from_openssh(text)
                .map_err(|e| malformed(format!("invalid OpenSSH public key: {}", e)));
        }
    }

    if let Some(parsed) = parse_der(raw) {
        return parsed;
    }

    PublicKey::from_bytes(raw).map_err(|_| malformed("unrecognized public key encoding"))
}

fn pem_label(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("-----BEGIN ")?;
    let (label, _) = rest.split_once("-----")?;
    Some(label)
}

fn parse_pem(label: &str, pem_text: &str) -> Result<PublicKey, ConversionError> {
    if label != PEM_SPKI && label != PEM_PKCS1 {
        return Err(malformed(format!("unsupported PEM label '{}'", label)));
    }

    let (_, der) = pem::decode_vec(pem_text.as_bytes())
        .map_err(|e| malformed(format!("invalid PEM: {}", e)))?;

    if label == PEM_SPKI {
        let spki = SubjectPublicKeyInfoRef::from_der(&der)
            .map_err(|e| malformed(format!("invalid SPKI public key: {}", e)))?;
        from_spki(&spki, &der)
    } else {
        let key = Pkcs1RsaPublicKey::from_der(&der)
            .map_err(|e| malformed(format!("invalid PKCS#1 public key: {}", e)))?;
        from_pkcs1(&key)
    }
}

fn parse_der(raw: &[u8]) -> Option<Result<PublicKey, ConversionError>> {
    if let Ok(spki) = SubjectPublicKeyInfoRef::from_der(raw) {
        return Some(from_spki(&spki, raw));
    }
    if let Ok(key) = Pkcs1RsaPublicKey::from_der(raw) {
        return Some(from_pkcs1(&key));
    }
    None
}

fn from_spki(
    spki: &SubjectPublicKeyInfoRef<'_>,
    der: &[u8],
) -> Result<PublicKey, ConversionError> {
    let oid = spki.algorithm.oid;

    if oid == OID_ED25519 {
        let key = VerifyingKey::from_public_key_der(der)
            .map_err(|e| malformed(format!("invalid Ed25519 public key: {}", e)))?;
        return Ok(from_ed25519(&key));
    }

    if oid == OID_RSA_ENCRYPTION {
        let bits = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| malformed("RSA key bits are not octet aligned"))?;
        let key = Pkcs1RsaPublicKey::from_der(bits)
            .map_err(|e| malformed(format!("invalid RSA public key: {}", e)))?;
        return from_pkcs1(&key);
    }

    Err(malformed(format!(
        "unsupported SPKI algorithm {} (expected Ed25519 or RSA)",
        oid
    )))
}

/// Validate PKCS#1 parameters (exponent range, modulus size up to
/// [`RSA_MAX_BITS`]) and build the SSH key.
fn from_pkcs1(key: &Pkcs1RsaPublicKey<'_>) -> Result<PublicKey, ConversionError> {
    let n = BigUint::from_bytes_be(key.modulus.as_bytes());
    let e = BigUint::from_bytes_be(key.public_exponent.as_bytes());
    let key = rsa::RsaPublicKey::new_with_max_size(n, e, RSA_MAX_BITS)
        .map_err(|err| malformed(format!("invalid RSA public key: {}", err)))?;
    from_rsa(&key)
}

fn from_ed25519(key: &VerifyingKey) -> PublicKey {
    PublicKey::new(KeyData::Ed25519(Ed25519PublicKey(key.to_bytes())), "")
}

fn from_rsa(key: &rsa::RsaPublicKey) -> Result<PublicKey, ConversionError> {
    let e = Mpint::from_positive_bytes(&key.e().to_bytes_be())
        .map_err(|err| malformed(format!("invalid RSA exponent: {}", err)))?;
    let n = Mpint::from_positive_bytes(&key.n().to_bytes_be())
        .map_err(|err| malformed(format!("invalid RSA modulus: {}", err)))?;

    Ok(PublicKey::new(KeyData::Rsa(RsaPublicKey { e, n }), ""))
}

fn malformed(reason: impl Into<String>) -> ConversionError {
    ConversionError::MalformedKey {
        reason: reason.into(),
    }
}
