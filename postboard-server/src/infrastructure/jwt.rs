use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::{Actor, Role};

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error("token carries unknown role '{0}'")]
    UnknownRole(String),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) user_id: i64,
    pub(crate) role: String,
    pub(crate) exp: i64,
}

impl Claims {
    pub(crate) fn actor(&self) -> Result<Actor, JwtError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| JwtError::UnknownRole(self.role.clone()))?;
        Ok(Actor::new(self.user_id, role))
    }
}

/// Verifies bearer tokens issued by the identity service. Issuing tokens is not
/// this service's job.
pub(crate) struct JwtService {
    secret: String,
}

impl JwtService {
    const LEEWAY_SECONDS: u64 = 10;

    pub(crate) fn new(secret: &str) -> Self {
        JwtService {
            secret: secret.into(),
        }
    }

    pub(crate) fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = Self::LEEWAY_SECONDS;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(JwtError::Decode)?;

        Ok(token_data.claims)
    }

    #[cfg(test)]
    pub(crate) fn issue_for_tests(&self, user_id: i64, role: &str, ttl_seconds: i64) -> String {
        use jsonwebtoken::{EncodingKey, Header, encode};

        let claims = Claims {
            user_id,
            role: role.to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::seconds(ttl_seconds)).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("test token must encode")
    }
}
