use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;
use crate::domain::Role;

/// JWT payload. `sub` is the user id rendered as a string so tokens stay
/// portable across clients that expect a string subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse::<i32>()
            .context("Token subject is not a valid user id")
    }
}

pub fn issue_token(user_id: i32, role: Role, security: &SecurityConfig) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::minutes(security.access_token_expire_minutes)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(security.jwt_secret.as_bytes()),
    )
    .context("Failed to sign access token")
}

pub fn decode_token(token: &str, security: &SecurityConfig) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(security.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .context("Invalid or expired access token")?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn round_trips_claims() {
        let sec = security();
        let token = issue_token(42, Role::Admin, &sec).unwrap();
        let claims = decode_token(&token, &sec).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_wrong_secret() {
        let sec = security();
        let token = issue_token(7, Role::Employee, &sec).unwrap();

        let other = SecurityConfig {
            jwt_secret: "another-secret".to_string(),
            ..SecurityConfig::default()
        };
        assert!(decode_token(&token, &other).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_token("not.a.jwt", &security()).is_err());
    }
}
