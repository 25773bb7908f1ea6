/**
 * Authentication Middleware
 *
 * Protected routes require a session token, either in the `Authorization:
 * Bearer <token>` header or, for clients that cannot set headers (browser
 * `EventSource`, WebSocket upgrades), in a `token` query parameter. The
 * verified principal is attached to the request extensions and handed to
 * handlers through the `AuthUser` extractor.
 */

use axum::{
    extract::{FromRef, FromRequestParts, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::backend::auth::TokenVerifier;
use crate::backend::error::{BackendError, BackendResult};

/// Authenticated principal extracted from a session token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    /// Display name carried by the token, if any
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token from the `Authorization` header, falling back to `?token=`
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.token)
    })
    .filter(|t| !t.is_empty())
}

/// Verify a request's token and return its principal
pub fn authenticate(verifier: &TokenVerifier, headers: &HeaderMap, uri: &Uri) -> BackendResult<AuthenticatedUser> {
    let token = extract_token(headers, uri).ok_or_else(|| {
        tracing::warn!("[Auth] Missing session token");
        BackendError::unauthorized("missing session token")
    })?;

    let claims = verifier.verify_token(&token).map_err(|e| {
        tracing::warn!("[Auth] Invalid token: {:?}", e);
        BackendError::unauthorized("invalid session token")
    })?;

    if claims.sub.trim().is_empty() {
        return Err(BackendError::unauthorized("token has no subject"));
    }

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        name: claims.username,
    })
}

/// Reject requests without a valid session token
pub async fn auth_middleware(
    State(verifier): State<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let user = authenticate(&verifier, request.headers(), request.uri())?;
    tracing::debug!("[Auth] Request from {}", user.user_id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// Reads the principal the middleware stored; when the middleware did not
/// run on this route the token is verified on the spot.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    TokenVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(AuthUser(user.clone()));
        }
        let verifier = TokenVerifier::from_ref(state);
        authenticate(&verifier, &parts.headers, &parts.uri).map(AuthUser)
    }
}
