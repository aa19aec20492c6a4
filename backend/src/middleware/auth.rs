//! Authentication middleware
//!
//! Verifies bearer tokens issued by the identity provider. Accounts live with
//! the provider; the server only checks signatures and reads the subject.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Authenticated user information extracted from the token
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Provider user id (`sub` claim); owns every barn record
    pub user_id: String,
}

/// Token claims the server reads
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Authentication middleware that validates bearer tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(&request)?;

    let auth_user = verify_token(token, &state.config.auth).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        e
    })?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> AppResult<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })
}

/// Decode and validate a token against the configured secret
fn verify_token(token: &str, auth: &AuthConfig) -> AppResult<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    match &auth.issuer {
        Some(issuer) => validation.set_issuer(&[issuer]),
        None => validation.iss = None,
    }
    match &auth.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized("Token has no subject".to_string()));
    }

    Ok(AuthUser {
        user_id: claims.sub,
    })
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
        iss: &'a str,
        aud: &'a str,
    }

    fn auth_config() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            issuer: Some("barn-auth".to_string()),
            audience: Some("barn-app".to_string()),
        }
    }

    fn token(sub: &str, iss: &str, secret: &str) -> String {
        let claims = TestClaims {
            sub,
            exp: chrono::Utc::now().timestamp() + 3600,
            iss,
            aud: "barn-app",
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let user = verify_token(&token("uid-42", "barn-auth", "test-secret"), &auth_config())
            .unwrap();
        assert_eq!(user.user_id, "uid-42");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let err = verify_token(&token("uid-42", "barn-auth", "other"), &auth_config())
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bearer_token_extraction() {
        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request).unwrap(), "abc.def.ghi");

        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(matches!(bearer_token(&request), Err(AppError::Unauthorized(_))));

        let request = axum::http::Request::builder().body(axum::body::Body::empty()).unwrap();
        assert!(matches!(bearer_token(&request), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let result = verify_token(&token("uid-42", "someone-else", "test-secret"), &auth_config());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let result = verify_token(&token("", "barn-auth", "test-secret"), &auth_config());
        assert!(result.is_err());
    }
}
