//! User registration, login and dashboard endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, LoginResponse, RegisterRequest, UserPublic},
};

/// Register a new user.
///
/// Registration signs the new user straight in: the response carries a
/// bearer token alongside the created account. New users hold no
/// capabilities.
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created and signed in", body = LoginResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    request.validate()?;

    let response = state.services.users.register(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/accounts/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;
    Ok(Json(response))
}

/// Dashboard listing of all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<UserPublic>)
    )
)]
pub async fn dashboard(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<UserPublic>>> {
    let users = state.services.users.dashboard().await?;
    Ok(Json(users))
}
