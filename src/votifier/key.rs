use rsa::{pkcs1::DecodeRsaPublicKey, pkcs8::DecodePublicKey, Pkcs1v15Encrypt, RsaPublicKey};

use crate::error::EncryptionError;

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";
const PKCS1_HEADER: &str = "-----BEGIN RSA PUBLIC KEY-----";

/// Parses a server's public key from PEM or from the bare base64 body
/// that Votifier prints into its `public.key` file.
pub fn parse_public_key(material: &str) -> Result<RsaPublicKey, EncryptionError> {
    let material = material.trim();
    let invalid = |e: &dyn std::fmt::Display| EncryptionError::InvalidKey(e.to_string());

    if material.starts_with(PKCS1_HEADER) {
        return RsaPublicKey::from_pkcs1_pem(material).map_err(|e| invalid(&e));
    }

    if material.starts_with("-----BEGIN") {
        return RsaPublicKey::from_public_key_pem(material).map_err(|e| invalid(&e));
    }

    RsaPublicKey::from_public_key_pem(&wrap_pem(material)?).map_err(|e| invalid(&e))
}

/// Wraps a bare base64 SPKI body in PEM armor with 64 column lines.
fn wrap_pem(body: &str) -> Result<String, EncryptionError> {
    let body: String = body.split_whitespace().collect();
    if body.is_empty() || !body.is_ascii() {
        return Err(EncryptionError::InvalidKey("key body is not base64".to_string()));
    }

    let mut pem = String::with_capacity(body.len() + body.len() / 64 + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for line in body.as_bytes().chunks(64) {
        // ascii was checked above, so every chunk boundary is a char boundary
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    Ok(pem)
}

/// Encrypts `payload` with PKCS#1 v1.5 padding, which Votifier expects.
pub fn seal(key: &RsaPublicKey, payload: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    Ok(key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, payload)?)
}

#[cfg(test)]
mod tests {
    use rsa::{pkcs8::DecodePrivateKey, traits::PublicKeyParts, RsaPrivateKey};

    use super::*;

    const PUBLIC_PEM: &str = include_str!("../../tests/data/votifier_public.pem");
    const PUBLIC_PKCS1_PEM: &str = include_str!("../../tests/data/votifier_public_pkcs1.pem");
    const PRIVATE_PEM: &str = include_str!("../../tests/data/votifier_private.pem");

    fn bare_body() -> String {
        PUBLIC_PEM
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect()
    }

    #[test]
    fn parses_every_accepted_form() {
        let from_pem = parse_public_key(PUBLIC_PEM).unwrap();
        let from_bare = parse_public_key(&bare_body()).unwrap();
        let from_pkcs1 = parse_public_key(PUBLIC_PKCS1_PEM).unwrap();
        let from_spaced = parse_public_key(&format!("  {}\r\n", bare_body())).unwrap();

        assert_eq!(from_pem, from_bare);
        assert_eq!(from_pem, from_pkcs1);
        assert_eq!(from_pem, from_spaced);
        assert_eq!(from_pem.size(), 256);
    }

    #[test]
    fn rejects_garbage() {
        for material in [
            "",
            "not a key",
            "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----",
            "ключ",
        ] {
            assert!(
                matches!(parse_public_key(material), Err(EncryptionError::InvalidKey(_))),
                "{material:?} should be rejected"
            );
        }
    }

    #[test]
    fn sealed_payload_decrypts() {
        let key = parse_public_key(PUBLIC_PEM).unwrap();
        let private = RsaPrivateKey::from_pkcs8_pem(PRIVATE_PEM).unwrap();

        let sealed = seal(&key, b"{\"username\":\"Notch\"}").unwrap();
        assert_eq!(sealed.len(), 256);
        assert_eq!(
            private.decrypt(Pkcs1v15Encrypt, &sealed).unwrap(),
            b"{\"username\":\"Notch\"}"
        );
    }

    #[test]
    fn oversized_payload_fails() {
        let key = parse_public_key(PUBLIC_PEM).unwrap();
        assert!(matches!(
            seal(&key, &[b'x'; 300]),
            Err(EncryptionError::EncryptionFailed(_))
        ));
    }
}
