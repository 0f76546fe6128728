use crate::core::error::{ApiError, PasswordError};
use crate::core::extract::JsonBody;
use crate::core::state::AppState;
use crate::models::api::{CredentialsRequest, LoginResponse, SuccessResponse};
use crate::models::user::User;
use crate::security::gate::AuthStrategy;
use crate::security::password::{hash_password, verify_password};
use crate::security::session::SESSION_COOKIE;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the session login flow sends the browser after success
const LOGIN_REDIRECT: &str = "/api/index";

fn required_credentials(request: CredentialsRequest) -> Result<(String, String), ApiError> {
    match (request.username, request.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(ApiError::Validation(
            "Username and password required!".to_string(),
        )),
    }
}

/// Argon2 is deliberately slow, keep it off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Register a new account
///
/// POST /api/signup  {"username": "...", "password": "..."}
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let (username, password) = required_credentials(request)?;

    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Error creating user", e))?;

    if documents.users.get(&username).is_some() {
        info!(username = %username, "Signup refused, username taken");
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = run_blocking(move || hash_password(&password)).await?;
    let user = User::register(username, password_hash);
    let user_id = user.id.clone();
    let username = user.username.clone();

    // A concurrent signup may have claimed the name while we were hashing
    let inserted = documents
        .users
        .insert(user)
        .map_err(|e| ApiError::store("Error creating user", e))?;
    if !inserted {
        info!(username = %username, "Signup refused, username taken");
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    info!(username = %username, user_id = %user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            message: "User created".to_string(),
        }),
    )
        .into_response())
}

/// Check credentials and hand out a token or a session
///
/// POST /api/login  {"username": "...", "password": "..."}
///
/// With the token strategy the response is `{success, token}`. With the
/// session strategy a signed `session` cookie is set and the client is
/// redirected to the index page.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let (username, password) = required_credentials(request).map_err(|_| invalid())?;

    let documents = state
        .database
        .connect()
        .await
        .map_err(|e| ApiError::store("Error logging in", e))?;

    let Some(user) = documents.users.get(&username) else {
        warn!(username = %username, "Login failed, unknown user");
        return Err(invalid());
    };

    let password_hash = user.password_hash.clone();
    let matches = run_blocking(move || verify_password(&password, &password_hash)).await?;
    if !matches {
        warn!(username = %username, "Login failed, wrong password");
        return Err(invalid());
    }

    match state.config.auth.strategy {
        AuthStrategy::Token => {
            let token = state
                .tokens
                .issue(&user)
                .map_err(|e| ApiError::Internal(e.to_string()))?;

            info!(username = %username, user_id = %user.id, "Token issued");

            Ok((
                StatusCode::OK,
                Json(LoginResponse {
                    success: true,
                    token,
                }),
            )
                .into_response())
        }
        AuthStrategy::Session => {
            let session_value = state.sessions.create(&user);
            let cookie = Cookie::build((SESSION_COOKIE, session_value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();

            info!(username = %username, user_id = %user.id, "Session created");

            Ok((jar.add(cookie), Redirect::to(LOGIN_REDIRECT)).into_response())
        }
    }
}

/// End the caller's session, if any
///
/// POST /api/logout
///
/// Token logins have no server-side state; the client just drops its token.
pub async fn logout_handler(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let jar = match jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) {
        Some(value) => {
            if state.sessions.revoke(&value) {
                info!("Session revoked");
            }
            jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
        }
        None => jar,
    };

    (
        jar,
        Json(SuccessResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{create_test_state, create_test_state_with_strategy};
    use axum::http::header::{LOCATION, SET_COOKIE};
    use http_body_util::BodyExt;

    fn credentials(username: &str, password: &str) -> JsonBody<CredentialsRequest> {
        JsonBody(CredentialsRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        })
    }

    #[tokio::test]
    async fn test_signup_success() {
        let (state, _temp_dir) = create_test_state();

        let response = signup_handler(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: SuccessResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);
        assert_eq!(body.message, "User created");
        assert!(!String::from_utf8_lossy(&bytes).contains("pw1"));

        let documents = state.database.connect().await.unwrap();
        let user = documents.users.get("alice").unwrap();
        assert_ne!(user.password_hash, "pw1");
        assert!(verify_password("pw1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_signup_duplicate() {
        let (state, _temp_dir) = create_test_state();

        signup_handler(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();
        let result = signup_handler(State(state.clone()), credentials("alice", "other")).await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let documents = state.database.connect().await.unwrap();
        assert_eq!(documents.users.len(), 1);
        assert!(verify_password("pw1", &documents.users.get("alice").unwrap().password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_signup_missing_fields() {
        let (state, _temp_dir) = create_test_state();

        let result = signup_handler(
            State(state),
            JsonBody(CredentialsRequest {
                username: Some("alice".to_string()),
                password: None,
            }),
        )
        .await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let (state, _temp_dir) = create_test_state();
        signup_handler(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();

        let response = login_handler(State(state.clone()), CookieJar::new(), credentials("alice", "pw1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: LoginResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);

        let claims = state.tokens.verify(&body.token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (state, _temp_dir) = create_test_state();
        signup_handler(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();

        let result = login_handler(State(state.clone()), CookieJar::new(), credentials("alice", "wrong")).await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (state, _temp_dir) = create_test_state();

        let result = login_handler(State(state), CookieJar::new(), credentials("ghost", "pw1")).await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_session_strategy_sets_cookie_and_redirects() {
        let (state, _temp_dir) = create_test_state_with_strategy(AuthStrategy::Session);
        signup_handler(State(state.clone()), credentials("alice", "pw1"))
            .await
            .unwrap();

        let response = login_handler(State(state.clone()), CookieJar::new(), credentials("alice", "pw1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), LOGIN_REDIRECT);

        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let (state, _temp_dir) = create_test_state_with_strategy(AuthStrategy::Session);
        let user = User::register("alice".to_string(), "hash".to_string());
        let value = state.sessions.create(&user);

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, value.clone()));
        let response = logout_handler(State(state.clone()), jar).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.sessions.is_empty());
        assert!(state.sessions.validate(&value).is_err());
    }
}
