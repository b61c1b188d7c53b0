/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new user
/// - `POST /api/auth/login` - Login and get a token
/// - `POST /api/auth/refresh` - Exchange a (possibly expired) token for a fresh one
/// - `GET /api/auth/profile` - Current user's profile (protected)
///
/// Login and refresh deliberately answer every failure with the same
/// generic 401 so responses do not reveal whether the email exists, the
/// password was wrong, or the account was deactivated.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    response::ApiResponse,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension,
};
use leadline_shared::{
    auth::{
        jwt::{self, Claims},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, User, UserProfile},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Given name
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: String,

    /// Family name
    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Payload returned by register, login, and refresh
#[derive(Debug, Serialize)]
pub struct AuthData {
    /// The authenticated user, without the password hash
    pub user: UserProfile,

    /// Signed JWT, valid for 7 days
    pub token: String,
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthData>>)> {
    req.validate()?;

    // Explicit pre-check for a friendlier message; the unique constraint
    // still backstops concurrent registrations.
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?;

    let token = jwt::create_token(&Claims::new(user.id), state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "User registered successfully",
            AuthData {
                user: user.into(),
                token,
            },
        )),
    ))
}

/// Login with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials (generic for every cause)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthData>>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(invalid());
    }

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = jwt::create_token(&Claims::new(user.id), state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::success_with_message(
        "Login successful",
        AuthData {
            user: user.into(),
            token,
        },
    )))
}

/// Exchange a bearer token for a fresh one
///
/// The presented token may be expired; its signature and issuer are still
/// fully verified, and the user must still exist and be active.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, forged, or orphaned token
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<AuthData>>> {
    let invalid = || ApiError::Unauthorized("Invalid token".to_string());

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    let claims = jwt::decode_expired_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(invalid());
    }

    let token = jwt::create_token(&Claims::new(user.id), state.jwt_secret())?;

    Ok(Json(ApiResponse::success_with_message(
        "Token refreshed",
        AuthData {
            user: user.into(),
            token,
        },
    )))
}

/// Current user's profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(user.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation_rules() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            first_name: "".to_string(),
            last_name: "Doe".to_string(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("first_name"));
        assert!(!fields.contains_key("last_name"));
    }

    #[test]
    fn test_register_valid_request() {
        let req = RegisterRequest {
            email: "jane@example.com".to_string(),
            password: "longenough".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
        };

        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_login_requires_password() {
        let req = LoginRequest {
            email: "jane@example.com".to_string(),
            password: "".to_string(),
        };

        assert!(req.validate().is_err());
    }
}
