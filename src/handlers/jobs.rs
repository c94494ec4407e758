// handlers/jobs.rs - /jobs routes

use axum::{
    extract::{Path, RawQuery},
    Extension,
};

use crate::api::{JobUpdate, ValidJson};
use crate::database::models::{Job, NewJob};
use crate::database::DbPool;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::sql::{FilterCriteria, JOB_FILTERS};

/// Job ids that are not integers name no job
pub(crate) fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>().map_err(|_| ApiError::not_found("Job is not found."))
}

/// POST /jobs (admin)
///
/// Returns 201 with the stored job, including its new id.
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    ValidJson(body): ValidJson<NewJob>,
) -> ApiResult<Job> {
    let job = Job::create(&pool, &body).await?;
    Ok(ApiResponse::created("job", job))
}

/// GET /jobs[?title=&minSalary=&hasEquity=]
///
/// Without criteria every job is listed. With criteria, a search matching
/// nothing is a 404.
pub async fn list(
    Extension(DbPool(pool)): Extension<DbPool>,
    RawQuery(query): RawQuery,
) -> ApiResult<Vec<Job>> {
    let criteria = FilterCriteria::from_query(query.as_deref().unwrap_or_default(), JOB_FILTERS)?;

    let jobs = if criteria.is_empty() {
        Job::find_all(&pool).await?
    } else {
        Job::find_filtered(&pool, &criteria).await?
    };
    Ok(ApiResponse::success("jobs", jobs))
}

/// GET /jobs/:id
pub async fn get(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> ApiResult<Job> {
    let job = Job::get(&pool, parse_id(&id)?).await?;
    Ok(ApiResponse::success("job", job))
}

/// PATCH /jobs/:id (admin)
///
/// An empty body is a 400; so is any attempt to change `id` or `companyHandle`.
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<JobUpdate>,
) -> ApiResult<Job> {
    let job = Job::update(&pool, parse_id(&id)?, &body.into_payload()).await?;
    Ok(ApiResponse::success("job", job))
}

/// DELETE /jobs/:id (admin)
pub async fn remove(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(id): Path<String>,
) -> ApiResult<i32> {
    let id = parse_id(&id)?;
    Job::remove(&pool, id).await?;
    Ok(ApiResponse::success("deleted", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_id_is_not_found() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for raw in ["abc", "1.5", "", "99999999999"] {
            let err = parse_id(raw).unwrap_err();
            assert!(matches!(err, ApiError::NotFound(_)), "{}", raw);
        }
    }
}
