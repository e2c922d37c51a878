//! Access token claim decoding

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Claims decoded from the access token payload
///
/// The backend issues the token; only the fields the dashboard displays are
/// modeled here. `username` is optional because some issuers only embed a
/// numeric user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub exp: Option<u64>,
}

impl Claims {
    /// The name shown in the profile badge, falling back to a placeholder.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("User")
    }
}

/// Decode the claims segment of a compact JWT without verifying it.
///
/// The token must have the usual `header.payload.signature` shape with a
/// base64url-encoded (unpadded) JSON payload.
pub fn decode_claims(token: &str) -> crate::Result<Claims> {
    let mut segments = token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => {
            return Err(AuthError::InvalidToken(
                "token is not a three-segment compact JWT".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        AuthError::InvalidToken(format!("payload segment is not valid base64url: {e}"))
    })?;

    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("payload is not valid claims JSON: {e}")))?;

    tracing::debug!("Decoded token claims for {}", claims.display_name());
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a structurally valid unsigned token around the given payload
    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn decode_full_claims() {
        let token = token_with_payload(r#"{"username":"alice","user_id":7,"exp":1767225600}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.user_id, Some(7));
        assert_eq!(claims.exp, Some(1767225600));
        assert_eq!(claims.display_name(), "alice");
    }

    #[test]
    fn decode_claims_without_username() {
        let token = token_with_payload(r#"{"user_id":3}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.username, None);
        assert_eq!(claims.display_name(), "User");
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        let err = decode_claims("only-one-segment").unwrap_err();
        assert!(err.to_string().contains("three-segment"));

        let err = decode_claims("a.b.c.d").unwrap_err();
        assert!(err.to_string().contains("three-segment"));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let err = decode_claims("header.!!!not-base64!!!.signature").unwrap_err();
        assert!(err.to_string().contains("base64url"));
    }

    #[test]
    fn decode_rejects_non_json_payload() {
        let payload = URL_SAFE_NO_PAD.encode(b"not json at all");
        let err = decode_claims(&format!("h.{payload}.s")).unwrap_err();
        assert!(err.to_string().contains("claims JSON"));
    }

    #[test]
    fn decode_rejects_padded_base64() {
        // Standard padded base64 is not valid in a compact JWT segment
        let payload = base64::engine::general_purpose::STANDARD.encode(br#"{"username":"x"}"#);
        assert!(payload.ends_with('='));
        let result = decode_claims(&format!("h.{payload}.s"));
        assert!(result.is_err());
    }
}
