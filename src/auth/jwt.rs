//! HS256 JWT bearer tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::IdentityVerifier;
use crate::config::AuthConfig;
use crate::transfer::error::TransferError;
use crate::transfer::types::AccountId;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (account id)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

pub struct JwtVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.leeway_secs)
    }

    /// Sign a token for `sub`. Issuance belongs to the session service; this
    /// exists for local tooling and tests.
    pub fn issue(&self, sub: &str, ttl: Duration) -> Result<String, TransferError> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + ttl).timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TransferError::Internal(format!("Failed to generate token: {}", e)))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify_token(&self, token: &str) -> Result<AccountId, TransferError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                tracing::debug!(error = %e, "Bearer token rejected");
                TransferError::InvalidCredential
            },
        )?;

        let sub = token_data.claims.sub.trim();
        if sub.is_empty() {
            return Err(TransferError::InvalidCredential);
        }
        Ok(AccountId::new(sub))
    }
}
