/// Bearer-token authentication middleware for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, validates the JWT,
/// confirms the user still exists and is active, and inserts an
/// [`AuthContext`] into the request extensions for handlers to consume.
///
/// Every authentication failure maps to a generic 401 so the response does
/// not reveal whether the token, the account, or the header was at fault.
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Json, Router, routing::get, middleware};
/// use leadline_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
/// use sqlx::PgPool;
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {}", auth.user_id)
/// }
///
/// fn protected_routes(pool: PgPool, secret: String) -> Router {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .layer(middleware::from_fn(move |req, next| {
///             jwt_auth_middleware(pool.clone(), secret.clone(), req, next)
///         }))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::validate_token;
use crate::models::user::User;

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing or malformed authorization header
    MissingCredentials,

    /// Token validation failed (bad signature, expired, wrong issuer)
    InvalidToken,

    /// Token was valid but the user no longer exists or is deactivated
    InactiveUser,

    /// Database error during user lookup
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "No token provided"),
            AuthError::InvalidToken | AuthError::InactiveUser => {
                (StatusCode::UNAUTHORIZED, "Invalid token")
            }
            AuthError::DatabaseError(ref msg) => {
                tracing::error!("Auth middleware database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

/// JWT authentication middleware
///
/// Validates the bearer token, checks the user is still active, and adds
/// [`AuthContext`] to the request extensions.
///
/// # Errors
///
/// Returns 401 if the header is missing, the token is invalid or expired,
/// or the user is gone or deactivated.
pub async fn jwt_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(token, &secret).map_err(|_| AuthError::InvalidToken)?;

    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::InactiveUser)?;

    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }

    req.extensions_mut()
        .insert(AuthContext { user_id: user.id });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InactiveUser.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::DatabaseError("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
