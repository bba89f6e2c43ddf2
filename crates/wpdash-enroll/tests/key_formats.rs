//! Key conversion against fixtures produced by OpenSSL and ssh-keygen.
//!
//! `rsa.openssh` is `ssh-keygen -i -m PKCS8 -f rsa_spki.pem`, so RSA output
//! is checked against an independent implementation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ssh_key::Algorithm;
use wpdash_enroll::{convert, encode_transport, parse_public_key, ConversionError, KeyArtifact};

const RSA_SPKI_PEM: &str = include_str!("fixtures/rsa_spki.pem");
const RSA_PKCS1_PEM: &str = include_str!("fixtures/rsa_pkcs1.pem");
const RSA_SPKI_DER: &[u8] = include_bytes!("fixtures/rsa_spki.der");
const RSA_OPENSSH: &str = include_str!("fixtures/rsa.openssh");
const RSA8192_SPKI_PEM: &str = include_str!("fixtures/rsa8192_spki.pem");
const RSA8192_PKCS1_PEM: &str = include_str!("fixtures/rsa8192_pkcs1.pem");
const RSA8192_SPKI_DER: &[u8] = include_bytes!("fixtures/rsa8192_spki.der");
const RSA8192_OPENSSH: &str = include_str!("fixtures/rsa8192.openssh");
const ED25519_SPKI_PEM: &str = include_str!("fixtures/ed25519_spki.pem");
const ED25519_SPKI_DER: &[u8] = include_bytes!("fixtures/ed25519_spki.der");
const ED25519_OPENSSH: &str = include_str!("fixtures/ed25519.openssh");
const ECDSA_OPENSSH: &str = include_str!("fixtures/ecdsa_p256.openssh");

const IDENTITY: &str = "wpdash@example.com";

fn convert_raw(raw: &[u8]) -> Result<KeyArtifact, ConversionError> {
    convert(encode_transport(raw).as_bytes(), IDENTITY)
}

fn expected_line(openssh_fixture: &str) -> String {
    format!("{} {}", openssh_fixture.trim(), IDENTITY)
}

#[test]
fn test_rsa_spki_pem_matches_ssh_keygen() {
    let artifact = convert_raw(RSA_SPKI_PEM.as_bytes()).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(RSA_OPENSSH));
    assert_eq!(artifact.comment, IDENTITY);
}

#[test]
fn test_rsa_pkcs1_pem_matches_ssh_keygen() {
    let artifact = convert_raw(RSA_PKCS1_PEM.as_bytes()).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(RSA_OPENSSH));
}

#[test]
fn test_rsa_der_matches_ssh_keygen() {
    let artifact = convert_raw(RSA_SPKI_DER).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(RSA_OPENSSH));
}

#[test]
fn test_rsa_8192_all_forms_match_ssh_keygen() {
    let expected = expected_line(RSA8192_OPENSSH);

    for raw in [
        RSA8192_SPKI_PEM.as_bytes(),
        RSA8192_PKCS1_PEM.as_bytes(),
        RSA8192_SPKI_DER,
        RSA8192_OPENSSH.as_bytes(),
    ] {
        let artifact = convert_raw(raw).expect("conversion failed");
        assert_eq!(artifact.openssh_text().unwrap(), expected);
    }
}

#[test]
fn test_ed25519_forms_agree() {
    let expected = expected_line(ED25519_OPENSSH);

    for raw in [
        ED25519_SPKI_PEM.as_bytes(),
        ED25519_SPKI_DER,
        ED25519_OPENSSH.as_bytes(),
    ] {
        let artifact = convert_raw(raw).expect("conversion failed");
        assert_eq!(artifact.openssh_text().unwrap(), expected);
    }
}

#[test]
fn test_ssh_wire_blob() {
    let blob_b64 = ED25519_OPENSSH.split_whitespace().nth(1).unwrap();
    let blob = BASE64.decode(blob_b64).unwrap();

    let artifact = convert_raw(&blob).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(ED25519_OPENSSH));
}

#[test]
fn test_crlf_pem() {
    let crlf = RSA_SPKI_PEM.replace('\n', "\r\n");
    let artifact = convert_raw(crlf.as_bytes()).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(RSA_OPENSSH));
}

#[test]
fn test_existing_comment_is_replaced() {
    let commented = format!("{} someone@laptop", ED25519_OPENSSH.trim());
    let artifact = convert_raw(commented.as_bytes()).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(ED25519_OPENSSH));
}

#[test]
fn test_ecdsa_openssh_passes_through() {
    let artifact = convert_raw(ECDSA_OPENSSH.as_bytes()).expect("conversion failed");
    assert_eq!(artifact.openssh_text().unwrap(), expected_line(ECDSA_OPENSSH));
}

#[test]
fn test_round_trip_recovers_key_material() {
    for (raw, algorithm) in [
        (RSA_SPKI_PEM.as_bytes(), Algorithm::Rsa { hash: None }),
        (ED25519_SPKI_PEM.as_bytes(), Algorithm::Ed25519),
    ] {
        let original = parse_public_key(raw).unwrap();
        let artifact = convert_raw(raw).unwrap();
        let recovered = artifact.public_key().unwrap();

        assert_eq!(recovered.algorithm(), algorithm);
        assert_eq!(recovered.key_data(), original.key_data());
        assert_eq!(recovered.comment(), IDENTITY);
    }
}

#[test]
fn test_fingerprint_is_stable() {
    let a = convert_raw(ED25519_SPKI_PEM.as_bytes()).unwrap();
    let b = convert(
        encode_transport(ED25519_OPENSSH.as_bytes()).as_bytes(),
        "wpdash@other.example",
    )
    .unwrap();

    let fingerprint = a.fingerprint().unwrap();
    assert!(fingerprint.starts_with("SHA256:"));
    assert_eq!(fingerprint, b.fingerprint().unwrap());
}

#[test]
fn test_malformed_inputs() {
    let truncated_pem = &RSA_SPKI_PEM[..RSA_SPKI_PEM.len() / 2];
    let bad_inputs: [&[u8]; 4] = [
        b"hello world",
        truncated_pem.as_bytes(),
        &RSA_SPKI_DER[..40],
        b"ssh-rsa not-base64!",
    ];

    for raw in bad_inputs {
        let result = convert_raw(raw);
        assert!(
            matches!(result, Err(ConversionError::MalformedKey { .. })),
            "expected MalformedKey for {:?}, got {:?}",
            String::from_utf8_lossy(raw),
            result
        );
    }
}
