use std::collections::HashMap;

use axum::{
    extract::{Path, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{verify_jwt, Claims};
use crate::config;
use crate::error::ApiError;

/// Identity of the caller, decoded from a verified bearer token.
///
/// Inserted into request extensions at most once by [`authenticate_jwt`] and
/// never modified afterwards. Its absence means the request is anonymous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Identify the caller from an `Authorization: Bearer <token>` header.
///
/// A missing or invalid token is not an error here: the request simply goes on
/// without an [`AuthContext`], and the policy middleware decides what that means.
pub async fn authenticate_jwt(mut request: Request, next: Next) -> Response {
    if let Some(context) = identify(request.headers(), &config::config().security.jwt_secret) {
        request.extensions_mut().insert(context);
    }
    next.run(request).await
}

/// Must be logged in
pub async fn ensure_logged_in(request: Request, next: Next) -> Result<Response, ApiError> {
    require_authenticated(request.extensions().get::<AuthContext>())?;
    Ok(next.run(request).await)
}

/// Must be logged in as an admin
pub async fn ensure_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require_admin(request.extensions().get::<AuthContext>())?;
    Ok(next.run(request).await)
}

/// Must be the user named by the `:username` path segment, or an admin
pub async fn ensure_correct_user_or_admin(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let username = params.get("username").map(String::as_str).unwrap_or_default();
    require_self_or_admin(request.extensions().get::<AuthContext>(), username)?;
    Ok(next.run(request).await)
}

pub fn identify(headers: &HeaderMap, secret: &str) -> Option<AuthContext> {
    let token = extract_bearer_token(headers)?;
    match verify_jwt(token, secret) {
        Ok(claims) => Some(AuthContext::from(claims)),
        Err(e) => {
            tracing::debug!("Ignoring bearer token: {}", e);
            None
        }
    }
}

/// Extract the token from a well-formed bearer header. The scheme word is
/// matched case-insensitively and surrounding whitespace is ignored.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = auth_str.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub fn require_authenticated(context: Option<&AuthContext>) -> Result<&AuthContext, ApiError> {
    context.ok_or_else(|| ApiError::unauthorized("You must be logged in"))
}

pub fn require_admin(context: Option<&AuthContext>) -> Result<&AuthContext, ApiError> {
    match context {
        Some(ctx) if ctx.is_admin => Ok(ctx),
        _ => Err(ApiError::unauthorized("You must be an admin")),
    }
}

/// Passes for admins and for the user whose name equals `username` exactly.
pub fn require_self_or_admin<'a>(
    context: Option<&'a AuthContext>,
    username: &str,
) -> Result<&'a AuthContext, ApiError> {
    match context {
        Some(ctx) if ctx.is_admin || ctx.username == username => Ok(ctx),
        _ => Err(ApiError::unauthorized("You must be the user or an admin")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn ctx(username: &str, is_admin: bool) -> AuthContext {
        AuthContext {
            username: username.to_string(),
            is_admin,
        }
    }

    #[test]
    fn extracts_bearer_token_variants() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers_with("BEARER   abc  ")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers_with("  Bearer\tabc")), Some("abc"));
    }

    #[test]
    fn ignores_malformed_headers() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer    ")), None);
        assert_eq!(extract_bearer_token(&headers_with("abc")), None);
    }

    #[test]
    fn identifies_valid_token() {
        let token = generate_jwt(&Claims::new("test", false), SECRET).unwrap();
        let context = identify(&headers_with(&format!("Bearer {}", token)), SECRET);
        assert_eq!(context, Some(ctx("test", false)));
    }

    #[test]
    fn invalid_token_is_anonymous() {
        let token = generate_jwt(&Claims::new("test", false), "wrong").unwrap();
        assert_eq!(identify(&headers_with(&format!("Bearer {}", token)), SECRET), None);
        assert_eq!(identify(&headers_with("Bearer not.a.token"), SECRET), None);
        assert_eq!(identify(&HeaderMap::new(), SECRET), None);
    }

    #[test]
    fn logged_in_requires_context() {
        let user = ctx("test", false);
        assert!(require_authenticated(Some(&user)).is_ok());
        assert!(matches!(require_authenticated(None), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn admin_requires_admin_flag() {
        assert!(require_admin(Some(&ctx("admin", true))).is_ok());
        assert!(matches!(require_admin(Some(&ctx("test", false))), Err(ApiError::Unauthorized(_))));
        assert!(matches!(require_admin(None), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn self_or_admin() {
        assert!(require_self_or_admin(Some(&ctx("alice", false)), "alice").is_ok());
        assert!(require_self_or_admin(Some(&ctx("any-admin", true)), "alice").is_ok());
        assert!(matches!(
            require_self_or_admin(Some(&ctx("bob", false)), "alice"),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(require_self_or_admin(None, "alice"), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn self_match_is_exact() {
        assert!(require_self_or_admin(Some(&ctx("Alice", false)), "alice").is_err());
        assert!(require_self_or_admin(Some(&ctx("alice ", false)), "alice").is_err());
    }
}
