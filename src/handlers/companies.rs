// handlers/companies.rs - /companies routes

use axum::{
    extract::{Path, RawQuery},
    Extension,
};

use crate::api::{CompanyUpdate, ValidJson};
use crate::database::models::{Company, CompanyDetail, NewCompany};
use crate::database::DbPool;
use crate::middleware::{ApiResponse, ApiResult};
use crate::sql::{FilterCriteria, COMPANY_FILTERS};

/// POST /companies (admin)
pub async fn create(
    Extension(DbPool(pool)): Extension<DbPool>,
    ValidJson(body): ValidJson<NewCompany>,
) -> ApiResult<Company> {
    let company = Company::create(&pool, &body).await?;
    Ok(ApiResponse::created("company", company))
}

/// GET /companies[?nameLike=&minEmployees=&maxEmployees=]
pub async fn list(
    Extension(DbPool(pool)): Extension<DbPool>,
    RawQuery(query): RawQuery,
) -> ApiResult<Vec<Company>> {
    let criteria = FilterCriteria::from_query(query.as_deref().unwrap_or_default(), COMPANY_FILTERS)?;

    let companies = if criteria.is_empty() {
        Company::find_all(&pool).await?
    } else {
        Company::find_filtered(&pool, &criteria).await?
    };
    Ok(ApiResponse::success("companies", companies))
}

/// GET /companies/:handle - the company with its jobs
pub async fn get(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(handle): Path<String>,
) -> ApiResult<CompanyDetail> {
    let company = Company::get(&pool, &handle).await?;
    Ok(ApiResponse::success("company", company))
}

/// PATCH /companies/:handle (admin)
pub async fn update(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(handle): Path<String>,
    ValidJson(body): ValidJson<CompanyUpdate>,
) -> ApiResult<Company> {
    let company = Company::update(&pool, &handle, &body.into_payload()).await?;
    Ok(ApiResponse::success("company", company))
}

/// DELETE /companies/:handle (admin)
pub async fn remove(
    Extension(DbPool(pool)): Extension<DbPool>,
    Path(handle): Path<String>,
) -> ApiResult<String> {
    Company::remove(&pool, &handle).await?;
    Ok(ApiResponse::success("deleted", handle))
}
