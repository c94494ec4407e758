use axum::{
    handler::Handler,
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::database::{DatabaseManager, DbPool};
use crate::error::ApiError;
use crate::handlers::{auth, companies, jobs, users};
use crate::middleware::{authenticate_jwt, ensure_admin, ensure_correct_user_or_admin, ensure_logged_in};

/// Build the full router around a connection pool.
///
/// Every request passes through [`authenticate_jwt`]; individual routes then
/// add the policy they need.
pub fn app(pool: PgPool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(company_routes())
        .merge(job_routes())
        .merge(user_routes())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(Extension(DbPool(pool)))
                .layer(from_fn(authenticate_jwt)),
        );

    let config = config::config();
    let router = if config.security.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_routes() -> Router {
    Router::new()
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
}

fn company_routes() -> Router {
    Router::new()
        .route(
            "/companies",
            get(companies::list).post(
                companies::create
                    .layer(from_fn(ensure_admin))
                    .layer(from_fn(ensure_logged_in)),
            ),
        )
        .route(
            "/companies/:handle",
            get(companies::get)
                .patch(
                    companies::update
                        .layer(from_fn(ensure_admin))
                        .layer(from_fn(ensure_logged_in)),
                )
                .delete(
                    companies::remove
                        .layer(from_fn(ensure_admin))
                        .layer(from_fn(ensure_logged_in)),
                ),
        )
}

fn job_routes() -> Router {
    Router::new()
        .route(
            "/jobs",
            get(jobs::list).post(
                jobs::create
                    .layer(from_fn(ensure_admin))
                    .layer(from_fn(ensure_logged_in)),
            ),
        )
        .route(
            "/jobs/:id",
            get(jobs::get)
                .patch(
                    jobs::update
                        .layer(from_fn(ensure_admin))
                        .layer(from_fn(ensure_logged_in)),
                )
                .delete(
                    jobs::remove
                        .layer(from_fn(ensure_admin))
                        .layer(from_fn(ensure_logged_in)),
                ),
        )
}

fn user_routes() -> Router {
    Router::new()
        .route(
            "/users",
            get(users::list)
                .post(users::create)
                .route_layer(from_fn(ensure_admin))
                .route_layer(from_fn(ensure_logged_in)),
        )
        .route(
            "/users/:username",
            get(users::get)
                .patch(users::update)
                .delete(users::remove)
                .route_layer(from_fn(ensure_correct_user_or_admin)),
        )
        .route(
            "/users/:username/jobs/:id",
            post(users::apply).route_layer(from_fn(ensure_correct_user_or_admin)),
        )
}

/// GET /health - 200 when the database answers, 503 otherwise
async fn health(Extension(DbPool(pool)): Extension<DbPool>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}
