use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{internal, AppError};
use crate::state::AuthConfig;

pub const ROLE_USER: &str = "user";
pub const ROLE_CAPTAIN: &str = "captain";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

pub fn issue(auth: &AuthConfig, subject: Uuid, role: &str) -> Result<String, AppError> {
    let expiration = (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize;

    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(internal)
}

pub fn verify(auth: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthenticationError("invalid token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".into(),
            expiration: 3600,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let auth = test_auth();
        let id = Uuid::new_v4();

        let token = issue(&auth, id, ROLE_USER).unwrap();
        let claims = verify(&auth, &token).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, ROLE_USER);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = test_auth();
        let other = AuthConfig {
            secret: "other-secret".into(),
            expiration: 3600,
        };

        let token = issue(&auth, Uuid::new_v4(), ROLE_CAPTAIN).unwrap();
        assert!(verify(&other, &token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let auth = test_auth();
        assert!(verify(&auth, "not-a-token").is_err());
    }
}
