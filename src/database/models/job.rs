use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{bind_params_query_as, select_sql};
use crate::sql::{build_filter_clause, sql_for_partial_update, FilterCriteria, SqlParam};

/// Columns returned for every job; equity is NUMERIC in storage and read back as float
const JOB_COLUMNS: &str = "id, title, salary, equity::FLOAT8 AS equity, company_handle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

impl Job {
    /// Create a job. The company check and the insert share one transaction and
    /// the company row stays key-share locked until commit, so it cannot be
    /// deleted in between.
    ///
    /// Fails with `BadRequest("Company not found")` for an unknown handle.
    pub async fn create(pool: &PgPool, new: &NewJob) -> Result<Job, DatabaseError> {
        let mut tx = pool.begin().await?;

        let company = sqlx::query_scalar::<_, String>(
            "SELECT handle FROM companies WHERE handle = $1 FOR KEY SHARE",
        )
        .bind(&new.company_handle)
        .fetch_optional(&mut *tx)
        .await?;

        if company.is_none() {
            return Err(DatabaseError::BadRequest("Company not found".to_string()));
        }

        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {}",
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(&new.title)
            .bind(new.salary)
            .bind(new.equity)
            .bind(&new.company_handle)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Created job {} for company {}", job.id, job.company_handle);
        Ok(job)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Job>, DatabaseError> {
        let sql = select_sql(JOB_COLUMNS, "jobs", "", "id");
        Ok(sqlx::query_as::<_, Job>(&sql).fetch_all(pool).await?)
    }

    /// Jobs matching every criterion, ordered by id.
    ///
    /// A search that matches nothing is a `NotFound`, not an empty list.
    pub async fn find_filtered(pool: &PgPool, criteria: &FilterCriteria) -> Result<Vec<Job>, DatabaseError> {
        let where_result = build_filter_clause(criteria);
        let sql = select_sql(JOB_COLUMNS, "jobs", &where_result.query, "id");
        tracing::debug!("Job filter: {} ({} params)", where_result.query, where_result.params.len());

        let jobs = bind_params_query_as(sqlx::query_as::<_, Job>(&sql), &where_result.params)
            .fetch_all(pool)
            .await?;

        if jobs.is_empty() {
            return Err(DatabaseError::NotFound(
                "No jobs matching your filters are found.".to_string(),
            ));
        }
        Ok(jobs)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Job, DatabaseError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Job is not found.".to_string()))
    }

    /// Partial update; only the supplied fields change.
    pub async fn update(pool: &PgPool, id: i32, data: &[(&str, SqlParam)]) -> Result<Job, DatabaseError> {
        let set = sql_for_partial_update(data, &[])?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {}",
            set.query,
            set.params.len() + 1,
            JOB_COLUMNS
        );

        bind_params_query_as(sqlx::query_as::<_, Job>(&sql), &set.params)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Job not found.".to_string()))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> Result<(), DatabaseError> {
        let deleted = sqlx::query_scalar::<_, i32>("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound("Job not found.".to_string())),
        }
    }
}
