use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use playsync_store::{
    PrimaryKey, TokenPair, UserData, ACCESS_TOKEN_DURATION_IN_MINUTES,
    REFRESH_TOKEN_DURATION_IN_DAYS,
};

use crate::{errors::ServerError, ServerContext};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Wraps the authenticated user so [FromRequestParts] can be implemented
pub struct Session(UserData);

/// Like [Session], but resolves to nothing instead of rejecting the request
pub struct OptionalSession(pub Option<UserData>);

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> UserData {
        self.0.clone()
    }
}

/// Pulls the access token from the auth cookie, falling back to a Bearer
/// header for clients that don't use cookies
fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);

    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|x| x.to_str().ok())
        .and_then(|x| x.strip_prefix("Bearer "))
        .map(|x| x.trim().to_string())
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let token = token_from_parts(parts).ok_or(ServerError::MissingToken)?;
        let user = context.playsync.auth.session(&token).await?;

        Ok(Self(user))
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for OptionalSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let user = match token_from_parts(parts) {
            Some(token) => context.playsync.auth.session(&token).await.ok(),
            None => None,
        };

        Ok(Self(user))
    }
}

fn auth_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    production: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(max_age);

    // Cross-site cookies require Secure, which needs https. Local
    // development falls back to Lax over plain http.
    if production {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }

    cookie
}

/// Builds the cookie pair set on login and refresh
pub fn token_cookies(pair: &TokenPair, production: bool) -> CookieJar {
    CookieJar::new()
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token.clone(),
            time::Duration::minutes(ACCESS_TOKEN_DURATION_IN_MINUTES),
            production,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
            time::Duration::days(REFRESH_TOKEN_DURATION_IN_DAYS),
            production,
        ))
}

/// Builds a jar that clears both auth cookies
pub fn expired_cookies() -> CookieJar {
    let mut access = Cookie::from(ACCESS_TOKEN_COOKIE);
    let mut refresh = Cookie::from(REFRESH_TOKEN_COOKIE);

    access.set_path("/");
    refresh.set_path("/");

    CookieJar::new().remove(access).remove(refresh)
}

/// Rejects the request unless the resource belongs to the acting user
pub fn ensure_owner(owner_id: PrimaryKey, user_id: PrimaryKey) -> Result<(), ServerError> {
    if owner_id != user_id {
        return Err(ServerError::Forbidden("You do not own this resource"));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_production_cookie_is_cross_site() {
        let cookie = auth_cookie("accessToken", "x".to_string(), time::Duration::minutes(15), true);

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_development_cookie_is_lax() {
        let cookie = auth_cookie("accessToken", "x".to_string(), time::Duration::minutes(15), false);

        assert_eq!(cookie.http_only(), Some(true));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_ensure_owner() {
        assert!(ensure_owner(1, 1).is_ok());
        assert!(matches!(ensure_owner(1, 2), Err(ServerError::Forbidden(_))));
    }
}
