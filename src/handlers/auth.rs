// handlers/auth.rs - POST /auth/token and POST /auth/register

use axum::Extension;

use crate::api::{UserAuth, UserRegister, ValidJson};
use crate::auth::create_token;
use crate::database::models::{NewUser, User};
use crate::database::DbPool;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /auth/token - exchange username/password for a token
///
/// Returns `{ "token": "..." }`. Unknown users and wrong passwords both get 401.
pub async fn token(
    Extension(DbPool(pool)): Extension<DbPool>,
    ValidJson(body): ValidJson<UserAuth>,
) -> ApiResult<String> {
    let user = User::authenticate(&pool, &body.username, &body.password).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(ApiResponse::success("token", token))
}

/// POST /auth/register - create a non-admin account and log it in
///
/// Returns 201 with `{ "token": "..." }`. A taken username is a 400.
pub async fn register(
    Extension(DbPool(pool)): Extension<DbPool>,
    ValidJson(body): ValidJson<UserRegister>,
) -> ApiResult<String> {
    let user = User::register(&pool, &NewUser::from(body)).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(ApiResponse::created("token", token))
}
