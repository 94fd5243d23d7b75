//! Session token issuance and verification
//!
//! Tokens are HS256 JWTs. The payload layout is fixed for compatibility
//! with existing clients:
//!
//! ```json
//! {"usuario": {"id": 1, "nombre": "ana", "rol": "cliente"}, "iat": 1700000000, "exp": 1700086400}
//! ```

use cuidapet_core::{AuthConfig, Role, UserId, UserRecord};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Identity asserted by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(rename = "nombre")]
    pub username: String,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl From<&UserRecord> for SessionUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user
    pub usuario: SessionUser,
    /// Issued at timestamp (Unix epoch). Older tokens carry no `iat`.
    #[serde(default)]
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),

    #[error("Token lifetime of {0} seconds overflows the expiry timestamp")]
    LifetimeOverflow(u64),
}

impl JwtError {
    /// Short label used in audit records
    pub fn reason(&self) -> &'static str {
        match self {
            JwtError::ExpiredToken => "expired",
            JwtError::InvalidSignature => "invalid_signature",
            JwtError::InvalidToken => "malformed",
            JwtError::EncodingError(_)
            | JwtError::SystemTimeError(_)
            | JwtError::LifetimeOverflow(_) => "internal",
        }
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Signs and verifies session tokens with one process-wide secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl_secs: config.token_ttl_secs,
        }
    }

    /// Sign a token for `user` valid for the configured lifetime
    pub fn issue(&self, user: &SessionUser) -> Result<IssuedToken, JwtError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or(JwtError::LifetimeOverflow(self.ttl_secs))?;

        let claims = Claims {
            usuario: user.clone(),
            iat: now,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_secs,
        })
    }

    /// Verify a raw token, accepting an optional `Bearer ` prefix
    pub fn verify(&self, raw: &str) -> Result<SessionUser, JwtError> {
        self.decode_claims(raw).map(|claims| claims.usuario)
    }

    /// Verify and return the full claim set
    pub fn decode_claims(&self, raw: &str) -> Result<Claims, JwtError> {
        let token = raw.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(JwtError::InvalidToken);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            },
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..Default::default()
        }
    }

    fn ana() -> SessionUser {
        SessionUser {
            id: UserId(1),
            username: "ana".to_string(),
            role: Role::Client,
        }
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let service = TokenService::new(&AuthConfig {
            jwt_secret: "secret".to_string(),
            token_ttl_secs: u64::MAX,
            ..Default::default()
        });

        let err = service.issue(&ana()).unwrap_err();
        assert!(matches!(err, JwtError::LifetimeOverflow(u64::MAX)));
        assert_eq!(err.reason(), "internal");
    }

    #[test]
    fn test_issue_and_verify_token() {
        let service = TokenService::new(&config("secret"));
        let issued = service.issue(&ana()).expect("Failed to generate token");
        assert_eq!(issued.expires_in, 86_400);

        let claims = service.decode_claims(&issued.token).unwrap();
        assert_eq!(claims.usuario, ana());
        assert_eq!(claims.exp - claims.iat, 86_400);

        // Bearer prefix is optional
        let bearer = format!("Bearer {}", issued.token);
        assert_eq!(service.verify(&bearer).unwrap(), ana());
    }

    #[test]
    fn test_payload_layout() {
        let service = TokenService::new(&config("secret"));
        let issued = service.issue(&ana()).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let raw = decode::<serde_json::Value>(
            &issued.token,
            &DecodingKey::from_secret(b"secret"),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(raw["usuario"]["id"], 1);
        assert_eq!(raw["usuario"]["nombre"], "ana");
        assert_eq!(raw["usuario"]["rol"], "cliente");
        assert!(raw["iat"].is_u64());
        assert!(raw["exp"].is_u64());
    }

    #[test]
    fn test_invalid_token() {
        let service = TokenService::new(&config("secret"));
        assert!(matches!(
            service.verify("invalid.token.here"),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(service.verify(""), Err(JwtError::InvalidToken)));
        assert!(matches!(
            service.verify("Bearer "),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenService::new(&config("secret1"))
            .issue(&ana())
            .unwrap()
            .token;

        let result = TokenService::new(&config("secret2")).verify(&token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        // Create a token that expired 1 hour ago
        let claims = Claims {
            usuario: ana(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let result = TokenService::new(&config("secret")).verify(&token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_token_without_iat_accepted() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let payload = serde_json::json!({
            "usuario": {"id": 4, "nombre": "pablo", "rol": "programador"},
            "exp": now + 60,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let user = TokenService::new(&config("secret")).verify(&token).unwrap();
        assert_eq!(user.id, UserId(4));
        assert_eq!(user.role, Role::Programmer);
    }

    #[test]
    fn test_unknown_role_in_payload_rejected() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let payload = serde_json::json!({
            "usuario": {"id": 1, "nombre": "eve", "rol": "admin"},
            "iat": now,
            "exp": now + 60,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let result = TokenService::new(&config("secret")).verify(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }
}
