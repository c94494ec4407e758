// handlers/users.rs - /users routes

use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::Serialize;

use super::jobs::parse_id;
use crate::api::{UserUpdate, ValidJson};
use crate::auth::create_token;
use crate::database::models::{NewUser, User, UserDetail};
use crate::database::DbPool;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// A created user plus a token for them, as returned by POST /users
#[derive(Debug, Serialize)]
pub struct IssuedUser {
    pub user: User,
    pub token: String,
}

/// POST /users (admin) - create a user, possibly an admin
///
/// Returns 201 with `{ "user": {...}, "token": "..." }`.
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    ValidJson(body): ValidJson<NewUser>,
) -> Result<(StatusCode, Json<IssuedUser>), ApiError> {
    let user = User::register(&pool, &body).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(IssuedUser { user, token })))
}

/// GET /users (admin)
pub async fn list(Extension(DbPool(pool)): Extension<DbPool>) -> ApiResult<Vec<User>> {
    let users = User::find_all(&pool).await?;
    Ok(ApiResponse::success("users", users))
}

/// GET /users/:username (self or admin) - the user with applied job ids
pub async fn get(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(username): Path<String>,
) -> ApiResult<UserDetail> {
    let user = User::get(&pool, &username).await?;
    Ok(ApiResponse::success("user", user))
}

/// PATCH /users/:username (self or admin)
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(username): Path<String>,
    ValidJson(body): ValidJson<UserUpdate>,
) -> ApiResult<User> {
    let user = User::update(&pool, &username, &body.into_payload()).await?;
    Ok(ApiResponse::success("user", user))
}

/// DELETE /users/:username (self or admin)
pub async fn remove(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(username): Path<String>,
) -> ApiResult<String> {
    User::remove(&pool, &username).await?;
    Ok(ApiResponse::success("deleted", username))
}

/// POST /users/:username/jobs/:id (self or admin)
pub async fn apply(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path((username, id)): Path<(String, String)>,
) -> ApiResult<i32> {
    let id = parse_id(&id)?;
    User::apply_to_job(&pool, &username, id).await?;
    Ok(ApiResponse::success("applied", id))
}
