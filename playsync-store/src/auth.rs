use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::{Database, DatabaseError, NewUser, PrimaryKey, UserData};

/// How long an access token stays valid
pub const ACCESS_TOKEN_DURATION_IN_MINUTES: i64 = 15;
/// How long a refresh token stays valid
pub const REFRESH_TOKEN_DURATION_IN_DAYS: i64 = 10;

/// The secrets used to sign and verify tokens. Access and refresh tokens are
/// signed with different secrets so one can never pass for the other.
#[derive(Debug, Clone)]
pub struct AuthKeys {
    pub access_secret: String,
    pub refresh_secret: String,
}

/// The signed contents of a token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: PrimaryKey,
    pub exp: usize,
}

/// A freshly issued access and refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Identity or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The token was valid once but its lifetime is over
    #[error("Token has expired")]
    TokenExpired,
    /// The token is malformed, signed with the wrong secret, or revoked
    #[error("Token is invalid")]
    TokenInvalid,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(#[from] DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

pub struct Auth {
    db: Arc<dyn Database>,
    argon: Argon2<'static>,
    keys: AuthKeys,
}

/// A registration before the password is hashed
#[derive(Debug)]
pub struct NewRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

impl Auth {
    pub fn new(db: &Arc<dyn Database>, keys: AuthKeys) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
            keys,
        }
    }

    /// Checks that a username and email are still free to register
    pub async fn ensure_available(&self, username: &str, email: &str) -> Result<(), AuthError> {
        self.db
            .ensure_identity_available(&username.to_lowercase(), email)
            .await
            .map_err(AuthError::Db)
    }

    /// Creates a new account. The username is stored lowercased.
    pub async fn register(&self, new_registration: NewRegistration) -> Result<UserData, AuthError> {
        let hashed_password = hash_password(&self.argon, &new_registration.password)?;

        self.db
            .create_user(NewUser {
                username: new_registration.username.to_lowercase(),
                email: new_registration.email,
                password: hashed_password,
                full_name: new_registration.full_name,
                avatar_url: new_registration.avatar_url,
                cover_image_url: new_registration.cover_image_url,
            })
            .await
            .map_err(AuthError::Db)
    }

    /// Logs a user in by username or email, issuing a new token pair. The
    /// refresh token is stored on the user so it can be revoked.
    pub async fn login(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<(UserData, TokenPair), AuthError> {
        let user = self
            .db
            .user_by_identity(identity)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        verify_password(&self.argon, password, &user.password)?;

        let pair = self.issue_pair(user.id)?;
        self.db
            .set_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user, pair))
    }

    /// Resolves an access token to the user it belongs to
    pub async fn session(&self, access_token: &str) -> Result<UserData, AuthError> {
        let claims = verify_token(access_token, &self.keys.access_secret)?;

        self.db
            .user_by_id(claims.user_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::TokenInvalid,
                err => AuthError::Db(err),
            })
    }

    /// Exchanges a refresh token for a new pair, rotating the stored token.
    /// A token that doesn't match the one on record has been revoked or
    /// already used, and is rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(UserData, TokenPair), AuthError> {
        let claims = verify_token(refresh_token, &self.keys.refresh_secret)?;

        let user = self
            .db
            .user_by_id(claims.user_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::TokenInvalid,
                err => AuthError::Db(err),
            })?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AuthError::TokenInvalid);
        }

        let pair = self.issue_pair(user.id)?;
        self.db
            .set_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user, pair))
    }

    /// Clears the stored refresh token, ending the session
    pub async fn logout(&self, user_id: PrimaryKey) -> Result<(), DatabaseError> {
        self.db.set_refresh_token(user_id, None).await
    }

    /// Changes the password after verifying the current one
    pub async fn change_password(
        &self,
        user_id: PrimaryKey,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.db.user_by_id(user_id).await?;

        verify_password(&self.argon, current_password, &user.password)?;

        let hashed_password = hash_password(&self.argon, new_password)?;
        self.db.update_password(user_id, &hashed_password).await?;

        Ok(())
    }

    /// Issues a new token pair for a user
    pub fn issue_pair(&self, user_id: PrimaryKey) -> Result<TokenPair, AuthError> {
        let access_expiry = Utc::now() + Duration::minutes(ACCESS_TOKEN_DURATION_IN_MINUTES);
        let refresh_expiry = Utc::now() + Duration::days(REFRESH_TOKEN_DURATION_IN_DAYS);

        let access_token = sign_token(user_id, access_expiry.timestamp(), &self.keys.access_secret)?;
        let refresh_token =
            sign_token(user_id, refresh_expiry.timestamp(), &self.keys.refresh_secret)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn sign_token(user_id: PrimaryKey, expires_at: i64, secret: &str) -> Result<String, AuthError> {
    let claims = Claims {
        user_id,
        exp: expires_at as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::TokenInvalid)
}

/// Verifies a token's signature and expiry, returning its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    })
}

fn hash_password(argon: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    argon
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

fn verify_password(
    argon: &Argon2<'_>,
    password: &str,
    stored_hash: &str,
) -> Result<(), AuthError> {
    let stored_password = PasswordHash::parse(stored_hash, Encoding::default())
        .map_err(|e| AuthError::HashError(e.to_string()))?;

    argon
        .verify_password(password.as_bytes(), &stored_password)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let argon = Argon2::default();
        let hash = hash_password(&argon, "hunter2").expect("hashes");

        assert!(verify_password(&argon, "hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password(&argon, "wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_token_roundtrip() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign_token(42, exp, "secret").expect("signs");

        let claims = verify_token(&token, "secret").expect("verifies");
        assert_eq!(claims.user_id, 42);
    }

    #[test]
    fn test_expired_token_is_classified() {
        // Well past the validation leeway
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = sign_token(42, exp, "secret").expect("signs");

        assert!(matches!(
            verify_token(&token, "secret"),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign_token(42, exp, "access").expect("signs");

        // A refresh token must never verify as an access token
        assert!(matches!(
            verify_token(&token, "refresh"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
