//! Account route handlers.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use crate::middleware::{ApiJson, RequireUser};
use crate::models::UserView;
use crate::services::{AuthService, AuthSession};
use crate::state::AppState;

use super::{ApiResult, done, ok, ok_with};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password/request", post(request_reset))
        .route("/forgot-password", post(forgot_password))
        .route("/profile", get(profile).put(update_profile))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<AuthSession> {
    let session = AuthService::new(&state)
        .register(&body.name, &body.email, &body.password)
        .await?;
    ok(session)
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<AuthSession> {
    let session = AuthService::new(&state)
        .login(&body.email, &body.password)
        .await?;
    ok(session)
}

async fn request_reset(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetRequest>,
) -> ApiResult<()> {
    AuthService::new(&state)
        .request_password_reset(&body.email)
        .await?;
    done("If an account exists for this email, a reset code has been sent")
}

async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    AuthService::new(&state)
        .forgot_password(&body.email, &body.new_password, body.code.as_deref())
        .await?;
    done("Password updated successfully")
}

async fn profile(RequireUser(user): RequireUser) -> ApiResult<UserView> {
    ok(AuthService::profile(&user))
}

async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> ApiResult<UserView> {
    let view = AuthService::new(&state)
        .update_profile(&user, &body.name)
        .await?;
    ok_with(view, "Profile updated")
}
