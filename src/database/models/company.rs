use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{bind_params_query_as, select_sql};
use crate::sql::{build_filter_clause, sql_for_partial_update, FilterCriteria, FilterValue, SqlParam};

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// Request field names that differ from their column names
pub const COMPANY_FIELD_MAP: &[(&str, &str)] = &[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// A job as listed under its company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl Company {
    /// Fails with `BadRequest` when the handle is already taken.
    pub async fn create(pool: &PgPool, new: &NewCompany) -> Result<Company, DatabaseError> {
        let existing = sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
            .bind(&new.handle)
            .fetch_optional(pool)
            .await?;

        if existing.is_some() {
            return Err(DatabaseError::BadRequest(format!("Duplicate company: {}", new.handle)));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COMPANY_COLUMNS
        );
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(&new.handle)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.num_employees)
            .bind(&new.logo_url)
            .fetch_one(pool)
            .await?;

        tracing::info!("Created company {}", company.handle);
        Ok(company)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Company>, DatabaseError> {
        let sql = select_sql(COMPANY_COLUMNS, "companies", "", "name");
        Ok(sqlx::query_as::<_, Company>(&sql).fetch_all(pool).await?)
    }

    /// Companies matching every criterion, ordered by name.
    ///
    /// Fails with `BadRequest` when minEmployees exceeds maxEmployees, and with
    /// `NotFound` when nothing matches.
    pub async fn find_filtered(pool: &PgPool, criteria: &FilterCriteria) -> Result<Vec<Company>, DatabaseError> {
        check_employee_range(criteria)?;

        let where_result = build_filter_clause(criteria);
        let sql = select_sql(COMPANY_COLUMNS, "companies", &where_result.query, "name");

        let companies = bind_params_query_as(sqlx::query_as::<_, Company>(&sql), &where_result.params)
            .fetch_all(pool)
            .await?;

        if companies.is_empty() {
            return Err(DatabaseError::NotFound(
                "No companies matching your filters are found.".to_string(),
            ));
        }
        Ok(companies)
    }

    pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyDetail, DatabaseError> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, CompanyJob>(
            "SELECT id, title, salary, equity::FLOAT8 AS equity FROM jobs WHERE company_handle = $1 ORDER BY id",
        )
        .bind(handle)
        .fetch_all(pool)
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    pub async fn update(pool: &PgPool, handle: &str, data: &[(&str, SqlParam)]) -> Result<Company, DatabaseError> {
        let set = sql_for_partial_update(data, COMPANY_FIELD_MAP)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {}",
            set.query,
            set.params.len() + 1,
            COMPANY_COLUMNS
        );

        bind_params_query_as(sqlx::query_as::<_, Company>(&sql), &set.params)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))
    }

    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), DatabaseError> {
        let deleted = sqlx::query_scalar::<_, String>("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .fetch_optional(pool)
            .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("No company: {}", handle))),
        }
    }
}

pub fn check_employee_range(criteria: &FilterCriteria) -> Result<(), DatabaseError> {
    if let (Some(FilterValue::Integer(min)), Some(FilterValue::Integer(max))) =
        (criteria.get("minEmployees"), criteria.get("maxEmployees"))
    {
        if min > max {
            return Err(DatabaseError::BadRequest(
                "minEmployees cannot be greater than maxEmployees".to_string(),
            ));
        }
    }
    Ok(())
}
