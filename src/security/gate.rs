// Authentication gate for protected routes
//
// `[auth] strategy` picks the credential: a bearer token from /api/login,
// or the signed `session` cookie of the legacy login flow. Rejections are
// 403; accepted requests carry their Identity in the request extensions.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::AuthError;
use crate::core::state::AppState;
use crate::security::session::SESSION_COOKIE;
use crate::stores::active_collection::{CallerScope, CLIENT_ID_HEADER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    /// Stateless signed bearer tokens
    Token,
    /// Server-side sessions behind a signed cookie
    Session,
}

/// Who made an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

/// Pull the token out of an `Authorization` header value
///
/// Expects `<scheme> <token>`; the scheme itself is not checked.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;

    value
        .split_whitespace()
        .nth(1)
        .ok_or(AuthError::MalformedToken)
}

/// Validate the credential the configured strategy expects
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, AuthError> {
    match state.config.auth.strategy {
        AuthStrategy::Token => {
            let token = bearer_token(headers)?;
            let claims = state.tokens.verify(token)?;
            Ok(Identity {
                user_id: claims.sub,
                username: claims.username,
            })
        }
        AuthStrategy::Session => {
            let jar = CookieJar::from_headers(headers);
            let cookie = jar.get(SESSION_COOKIE).ok_or(AuthError::MissingSession)?;
            state.sessions.validate(cookie.value())
        }
    }
}

/// Axum middleware guarding protected routes
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate(&state, request.headers())?;

    debug!(user_id = %identity.user_id, path = %request.uri().path(), "Request authenticated");

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Resolves whose active-collection selection a request reads or writes
///
/// Never rejects: callers without valid credentials fall back to their
/// `X-Client-Id`, then to the shared anonymous scope.
impl FromRequestParts<Arc<AppState>> for CallerScope {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Ok(identity) = authenticate(state, &parts.headers) {
            return Ok(CallerScope::User(identity.user_id));
        }

        let client_id = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        Ok(match client_id {
            Some(client_id) => CallerScope::Client(client_id.to_string()),
            None => CallerScope::Anonymous,
        })
    }
}
