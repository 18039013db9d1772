//! Authentication Handlers
//!
//! Handles registration, login and profile management

use std::time::Duration;

use axum::{Extension, Json, extract::State};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{UserCreate, UserUpdate};
use crate::db::repository::{RepoError, UserRepository};
use crate::security_log;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-use shared DTOs for API consistency
use shared::client::{LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, UserInfo};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/register - create an account and issue a token
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::validation("A valid email is required"));
    }
    if req.password.len() < 6 {
        return Err(AppError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let repo = UserRepository::new(state.get_db());
    let user = repo
        .create(UserCreate {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            password: req.password,
            is_admin: false,
        })
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::EmailExists, msg),
            other => other.into(),
        })?;

    let user_info = UserInfo::from(user);
    let token = state
        .get_jwt_service()
        .generate_token(
            &user_info.id,
            &user_info.name,
            &user_info.email,
            user_info.is_admin,
        )
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = %user_info.id, email = %user_info.email, "User registered");

    Ok(ApiResponse::success(LoginResponse {
        token,
        user: user_info,
    }))
}

/// POST /api/auth/login - verify credentials and issue a token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let repo = UserRepository::new(state.get_db());
    let email = req.email.clone();

    let user = repo.find_by_email(&email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Check authentication result - unified error message to prevent email enumeration
    let user = match user {
        Some(u) => {
            // User found - check active status
            if !u.is_active {
                return Err(AppError::with_message(
                    ErrorCode::AccountDisabled,
                    "Account has been disabled",
                ));
            }

            // Verify password
            let password_valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                security_log!(
                    "WARN",
                    "login_failed",
                    email = email.as_str(),
                    reason = "invalid_credentials"
                );
                tracing::warn!(email = %email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            security_log!(
                "WARN",
                "login_failed",
                email = email.as_str(),
                reason = "user_not_found"
            );
            tracing::warn!(email = %email, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let user_info = UserInfo::from(user);
    let token = state
        .get_jwt_service()
        .generate_token(
            &user_info.id,
            &user_info.name,
            &user_info.email,
            user_info.is_admin,
        )
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = %user_info.id,
        email = %user_info.email,
        "User logged in successfully"
    );

    Ok(ApiResponse::success(LoginResponse {
        token,
        user: user_info,
    }))
}

/// GET /api/auth/me - current profile, fresh from the database
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<UserInfo>> {
    let repo = UserRepository::new(state.get_db());
    let fresh = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, "User no longer exists"))?;

    Ok(ApiResponse::success(UserInfo::from(fresh)))
}

/// PUT /api/auth/profile - update name, email or password
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ProfileUpdate>,
) -> AppResult<ApiResponse<UserInfo>> {
    if let Some(ref email) = req.email
        && (email.trim().is_empty() || !email.contains('@'))
    {
        return Err(AppError::validation("A valid email is required"));
    }
    if let Some(ref password) = req.password
        && password.len() < 6
    {
        return Err(AppError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let repo = UserRepository::new(state.get_db());
    let updated = repo
        .update(
            &user.id,
            UserUpdate {
                name: req.name,
                email: req.email,
                password: req.password,
                is_active: None,
            },
        )
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::EmailExists, msg),
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::UserNotFound, msg),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(ApiResponse::success(UserInfo::from(updated)))
}
