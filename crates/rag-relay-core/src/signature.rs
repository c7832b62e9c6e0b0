//! Request signature verification.
//!
//! The host platform signs every request body with ECDSA over P-256 and
//! sends the signature in a header as base64 of the ASN.1 DER encoding of
//! `SEQUENCE { INTEGER r, INTEGER s }`. Verification must run against the
//! raw body bytes exactly as received, before any JSON parsing.
//!
//! ```text
//!  header ──base64──▶ DER bytes ──parse──▶ (r, s) ─┐
//!                                                   ├─▶ ECDSA verify ─▶ bool
//!  raw body ─────────────SHA-256──────────▶ digest ─┘
//! ```
//!
//! Neither the signature components nor the key material are ever logged
//! or included in error messages.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};

use crate::error::PipelineError;

/// Decode a signature header into an ECDSA signature.
///
/// Fails with [`PipelineError::MalformedSignature`] if the header is not
/// base64, is not a DER `(r, s)` sequence, or has bytes after the sequence.
pub fn decode_signature_header(header: &str) -> Result<Signature, PipelineError> {
    let der = STANDARD
        .decode(header.trim())
        .map_err(|e| PipelineError::MalformedSignature(format!("invalid base64: {}", e)))?;

    let sig = Signature::from_der(&der)
        .map_err(|_| PipelineError::MalformedSignature("invalid DER (r, s) sequence".into()))?;

    // from_der accepts exactly one SEQUENCE; comparing against the canonical
    // re-encoding also rejects trailing bytes and non-minimal integers.
    if sig.to_der().as_bytes() != der.as_slice() {
        return Err(PipelineError::MalformedSignature(
            "unexpected bytes after DER sequence".into(),
        ));
    }

    Ok(sig)
}

/// Verify that `raw_body` was signed by `key`.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify and
/// an error for a header that cannot be decoded. Callers must reject the
/// request in both cases.
pub fn verify_signature(
    raw_body: &[u8],
    signature_header: &str,
    key: &VerifyingKey,
) -> Result<bool, PipelineError> {
    let sig = decode_signature_header(signature_header)?;
    let digest = Sha256::digest(raw_body);
    Ok(key.verify_prehash(&digest, &sig).is_ok())
}

/// A public key trusted to sign inbound requests.
#[derive(Clone)]
pub struct TrustedKey {
    /// Identifier the platform sends in the key identifier header.
    pub identifier: Option<String>,
    /// Whether the platform marks this key as the one currently in use.
    pub is_current: bool,
    key: VerifyingKey,
}

impl TrustedKey {
    pub fn new(identifier: Option<String>, key: VerifyingKey, is_current: bool) -> Self {
        Self {
            identifier,
            is_current,
            key,
        }
    }

    /// Parse a PEM-encoded `SubjectPublicKeyInfo` P-256 key.
    pub fn from_pem(identifier: Option<String>, pem: &str, is_current: bool) -> Result<Self, String> {
        let key = VerifyingKey::from_public_key_pem(pem.trim())
            .map_err(|e| format!("invalid P-256 public key: {}", e))?;
        Ok(Self::new(identifier, key, is_current))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }
}

impl std::fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedKey")
            .field("identifier", &self.identifier)
            .field("is_current", &self.is_current)
            .finish_non_exhaustive()
    }
}

/// The set of keys trusted to sign requests. Read-only after startup.
#[derive(Debug, Clone, Default)]
pub struct TrustedKeys {
    keys: Vec<TrustedKey>,
}

impl TrustedKeys {
    pub fn new(keys: Vec<TrustedKey>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[TrustedKey] {
        &self.keys
    }

    /// Authenticate a request body.
    ///
    /// With `key_id`, only the key carrying that identifier is tried and an
    /// unknown identifier is rejected. Without it, every trusted key is
    /// tried. The header is decoded once, so a malformed header fails with
    /// [`PipelineError::MalformedSignature`] regardless of the key set.
    pub fn verify(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        key_id: Option<&str>,
    ) -> Result<(), PipelineError> {
        let sig = decode_signature_header(signature_header)?;
        let digest = Sha256::digest(raw_body);

        let verified = match key_id {
            Some(id) => self
                .keys
                .iter()
                .find(|k| k.identifier.as_deref() == Some(id))
                .is_some_and(|k| k.key.verify_prehash(&digest, &sig).is_ok()),
            None => self
                .keys
                .iter()
                .any(|k| k.key.verify_prehash(&digest, &sig).is_ok()),
        };

        if verified {
            Ok(())
        } else {
            Err(PipelineError::Unauthorized)
        }
    }
}
