use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

use super::DiscordError;

/// Checks `X-Signature-Ed25519` over `timestamp ‖ body`.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Parse the hex public key shown on the Discord developer portal.
    pub fn from_hex(public_key: &str) -> Result<Self, DiscordError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| DiscordError::InvalidPublicKey(e.to_string()))?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            DiscordError::InvalidPublicKey(format!(
                "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
                b.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| DiscordError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    pub fn verify(&self, signature: &str, timestamp: &str, body: &[u8]) -> Result<(), DiscordError> {
        let sig = hex::decode(signature.trim()).map_err(|_| DiscordError::MalformedSignature)?;
        let sig: [u8; SIGNATURE_LENGTH] =
            sig.try_into().map_err(|_| DiscordError::MalformedSignature)?;
        let sig = Signature::from_bytes(&sig);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &sig)
            .map_err(|_| DiscordError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, SignatureVerifier) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(signing.verifying_key().to_bytes())).unwrap();
        (signing, verifier)
    }

    fn sign(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(key.sign(&message).to_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let (key, verifier) = keypair();
        let body = br#"{"type":1}"#;
        let sig = sign(&key, "1700000000", body);
        assert!(verifier.verify(&sig, "1700000000", body).is_ok());
    }

    #[test]
    fn rejects_tampered_body_or_timestamp() {
        let (key, verifier) = keypair();
        let sig = sign(&key, "1700000000", br#"{"type":1}"#);
        assert!(matches!(
            verifier.verify(&sig, "1700000000", br#"{"type":2}"#),
            Err(DiscordError::BadSignature)
        ));
        assert!(matches!(
            verifier.verify(&sig, "1700000001", br#"{"type":1}"#),
            Err(DiscordError::BadSignature)
        ));
    }

    #[test]
    fn rejects_garbage_signature() {
        let (_, verifier) = keypair();
        assert!(matches!(
            verifier.verify("zz", "1", b"{}"),
            Err(DiscordError::MalformedSignature)
        ));
        assert!(matches!(
            verifier.verify("abcd", "1", b"{}"),
            Err(DiscordError::MalformedSignature)
        ));
    }

    #[test]
    fn rejects_bad_public_keys() {
        assert!(SignatureVerifier::from_hex("not hex").is_err());
        assert!(SignatureVerifier::from_hex("abcd").is_err());
    }
}
