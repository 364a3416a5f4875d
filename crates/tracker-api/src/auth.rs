//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware resolving callers to tracker users.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {username}:{secret}
//! ```
//!
//! When no shared secret is configured (`AUTH_TOKEN` unset) the secret part
//! is ignored and `Bearer {username}` is accepted as well.
//!
//! ## Anonymous visitors
//!
//! A request without an `Authorization` header passes through with no
//! [`Credentials`]. Public pages take `Option<CallerIdentity>`; pages that
//! require login take [`CallerIdentity`] and answer 401 instead.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;
use tracker_core::TrackerUser;

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::state::AppState;

// ── Credentials ─────────────────────────────────────────────────────────────

/// Verified bearer credentials, injected by [`auth_middleware`].
///
/// The username is not yet resolved against the user store; that happens
/// in the [`CallerIdentity`] extractor, which has access to state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user: TrackerUser,
}

impl CallerIdentity {
    /// Whether the caller is a staff member.
    pub fn is_staff(&self) -> bool {
        self.user.is_staff
    }
}

/// Resolves the middleware's [`Credentials`] to a user.
///
/// Returns 401 if no credentials are present or the username is unknown.
#[axum::async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = parts
            .extensions
            .get::<Credentials>()
            .ok_or_else(|| AppError::Unauthorized("login required".into()))?;

        state
            .user_by_username(&credentials.username)
            .map(|user| CallerIdentity { user })
            .ok_or_else(|| {
                tracing::warn!(username = %credentials.username, "bearer token names unknown user");
                AppError::Unauthorized("unknown user".into())
            })
    }
}

/// Check that the caller is staff. Returns 403 Forbidden otherwise.
pub fn require_staff(caller: &CallerIdentity) -> Result<(), AppError> {
    if caller.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "staff access required, '{}' is not staff",
            caller.user.username
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets.
///
/// When lengths differ, performs a dummy comparison so the early return
/// takes about as long as a full comparison.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{username}:{secret}`.
///
/// With `expected_secret = None` the secret is not checked and may be omitted.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&str>,
) -> Result<Credentials, String> {
    let (username, secret) = match provided.split_once(':') {
        Some((username, secret)) => (username, Some(secret)),
        None => (provided, None),
    };

    if let Some(expected) = expected_secret {
        match secret {
            Some(secret) if constant_time_token_eq(secret, expected) => {}
            _ => return Err("invalid bearer token".into()),
        }
    }

    tracker_core::user::validate_username(username)
        .map_err(|e| format!("invalid username in bearer token: {e}"))?;

    Ok(Credentials {
        username: username.to_string(),
    })
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Extract and validate the Bearer token from the Authorization header.
///
/// Valid tokens inject [`Credentials`] into request extensions. A missing
/// header lets the request through anonymously; a present but invalid one
/// is rejected with 401.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|config| config.token.clone());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().map(str::to_owned));

    match auth_header {
        None => next.run(request).await,
        Some(Ok(value)) => match value.strip_prefix("Bearer ") {
            Some(provided) => match parse_bearer_token(provided, expected.as_deref()) {
                Ok(credentials) => {
                    tracing::debug!(username = %credentials.username, "authenticated request");
                    request.extensions_mut().insert(credentials);
                    next.run(request).await
                }
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    unauthorized_response(&msg)
                }
            },
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                unauthorized_response("authorization header must use Bearer scheme")
            }
        },
        Some(Err(_)) => {
            tracing::warn!("authentication failed: authorization header is not valid ASCII");
            unauthorized_response("malformed authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn whoami(caller: Option<CallerIdentity>) -> String {
        caller
            .map(|c| c.user.username)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    async fn staff_only(caller: CallerIdentity) -> Result<&'static str, AppError> {
        require_staff(&caller)?;
        Ok("ok")
    }

    /// Build a minimal router with the auth middleware and a couple of handlers.
    fn test_app(token: Option<&str>) -> Router {
        let state = AppState::new();
        let jana = TrackerUser::new("jana").unwrap();
        let mut boss = TrackerUser::new("boss").unwrap();
        boss.is_staff = true;
        state.users.insert(jana.id, jana);
        state.users.insert(boss.id, boss);

        Router::new()
            .route("/whoami", get(whoami))
            .route("/staff", get(staff_only))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig {
                token: token.map(str::to_string),
            }))
            .with_state(state)
    }

    async fn call(app: Router, path: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn valid_bearer_token_resolves_user() {
        let (status, body) = call(test_app(Some("s3cret")), "/whoami", Some("Bearer jana:s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "jana");
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let (status, body) = call(test_app(Some("s3cret")), "/whoami", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let (status, body) = call(test_app(Some("s3cret")), "/whoami", Some("Bearer jana:nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHORIZED"));
    }

    #[tokio::test]
    async fn basic_scheme_rejected() {
        let (status, _) = call(test_app(None), "/whoami", Some("Basic amFuYQ==")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn secret_optional_when_auth_disabled() {
        let (status, body) = call(test_app(None), "/whoami", Some("Bearer jana")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "jana");
    }

    #[tokio::test]
    async fn login_required_without_credentials() {
        let (status, _) = call(test_app(None), "/staff", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_user_is_unauthorized() {
        let (status, _) = call(test_app(None), "/staff", Some("Bearer ghost")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_staff_forbidden() {
        let (status, body) = call(test_app(None), "/staff", Some("Bearer jana")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("staff access required"));
    }

    #[tokio::test]
    async fn staff_allowed() {
        let (status, _) = call(test_app(None), "/staff", Some("Bearer boss")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn parse_bearer_token_rules() {
        assert_eq!(
            parse_bearer_token("jana:x", Some("x")).unwrap().username,
            "jana"
        );
        assert!(parse_bearer_token("jana", Some("x")).is_err());
        assert!(parse_bearer_token("bad name:x", Some("x")).is_err());
        assert_eq!(parse_bearer_token("jana:anything", None).unwrap().username, "jana");
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abc", "abd"));
        assert!(!constant_time_token_eq("abc", "abcd"));
    }

    #[test]
    fn auth_config_debug_redacts_token() {
        let config = AuthConfig {
            token: Some("s3cret".into()),
        };
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
