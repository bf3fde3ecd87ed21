use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::auth::claims::Claims;

/// Errors produced while encoding, parsing, or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The claims cannot be encoded into a token
    #[error("cannot encode claims: {0}")]
    Encoding(String),

    /// The token is structurally broken (wrong segment count, undecodable payload)
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match the shared secret
    #[error("token signature mismatch")]
    InvalidSignature,

    /// Signature is valid but the token has expired
    #[error("token expired at {expired_at}")]
    Expired { expired_at: i64 },
}

/// Signs, parses, and verifies compact signed tokens.
///
/// Tokens are three base64url segments joined by `.`: a header
/// (algorithm + type), the claims payload, and an HMAC-SHA256 signature
/// over header+payload computed with the shared secret. All operations
/// are pure CPU work; verification never touches the network, which is
/// what lets the gateway validate requests without calling back to the
/// issuing service.
pub struct TokenCodec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        // Signature-only validation: expiry is checked by `verify` against
        // a caller-supplied instant so the clock stays injectable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = Default::default();

        Self {
            header: Header::new(Algorithm::HS256),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Deterministically encode claims into a signed token.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        if claims.sub.is_empty() {
            return Err(TokenError::Encoding("claims are missing a subject".to_string()));
        }

        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Split a token into its segments and decode the claims payload.
    ///
    /// This is a structural operation only: the returned claims are
    /// UNVERIFIED and must never feed an authorization decision. Use
    /// `verify` for anything trust-related.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::Malformed(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| TokenError::Malformed(format!("payload is not base64url: {e}")))?;

        serde_json::from_slice(&payload)
            .map_err(|e| TokenError::Malformed(format!("payload is not valid claims JSON: {e}")))
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// Structural damage reports `Malformed`; a token that parses but
    /// whose signature does not recompute reports `InvalidSignature`
    /// (the comparison inside `jsonwebtoken` is constant-time); a token
    /// whose signature is fine but with `now >= exp` reports `Expired`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        self.parse(token)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                // The payload already decoded in `parse`, so base64 damage
                // here can only live in the signature segment.
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_) => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired {
                expired_at: data.claims.exp,
            });
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{Role, RoleSet};
    use chrono::TimeZone;

    fn codec() -> TokenCodec {
        TokenCodec::new("unit-test-secret")
    }

    fn claims_at(iat: i64, exp: i64) -> Claims {
        Claims {
            sub: "a@b.com".to_string(),
            roles: RoleSet::from([Role::Customer]),
            iat,
            exp,
        }
    }

    fn at(epoch: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(epoch, 0).unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let codec = codec();
        let claims = claims_at(1_000, 4_600);
        let token = codec.sign(&claims).unwrap();

        let verified = codec.verify(&token, at(1_000)).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_sign_rejects_missing_subject() {
        let codec = codec();
        let mut claims = claims_at(0, 3_600);
        claims.sub.clear();

        assert!(matches!(codec.sign(&claims), Err(TokenError::Encoding(_))));
    }

    #[test]
    fn test_parse_does_not_verify() {
        let codec = codec();
        let token = codec.sign(&claims_at(0, 3_600)).unwrap();

        // Re-sign the payload under another secret; parse still reads it.
        let other = TokenCodec::new("some-other-secret");
        let forged = other.sign(&claims_at(0, 3_600)).unwrap();

        assert_eq!(codec.parse(&forged).unwrap(), codec.parse(&token).unwrap());
        assert!(matches!(
            codec.verify(&forged, at(0)),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_flipping_any_signature_char_invalidates() {
        let codec = codec();
        let token = codec.sign(&claims_at(0, 3_600)).unwrap();

        let sig_start = token.rfind('.').unwrap() + 1;
        let sig_len = token.len() - sig_start;
        assert!(sig_len > 0);

        for i in 0..sig_len {
            let mut bytes = token.clone().into_bytes();
            let pos = sig_start + i;
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }

            assert!(
                matches!(
                    codec.verify(&tampered, at(0)),
                    Err(TokenError::InvalidSignature)
                ),
                "flipping signature char {i} was not rejected"
            );
        }
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let codec = codec();
        let claims = claims_at(0, 3_600);
        let token = codec.sign(&claims).unwrap();

        // Exactly at expiry counts as expired.
        assert!(matches!(
            codec.verify(&token, at(3_600)),
            Err(TokenError::Expired { expired_at: 3_600 })
        ));
        assert!(codec.verify(&token, at(3_599)).is_ok());
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec();

        assert!(matches!(
            codec.verify("not-a-token", at(0)),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            codec.verify("a.b", at(0)),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            codec.verify("a.!!!not-base64!!!.c", at(0)),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = codec().sign(&claims_at(0, 3_600)).unwrap();
        let other = TokenCodec::new("entirely-different-secret");

        assert!(matches!(
            other.verify(&token, at(0)),
            Err(TokenError::InvalidSignature)
        ));
    }
}
