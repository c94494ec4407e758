use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::auth::password::{hash_password, verify_password};
use crate::database::manager::DatabaseError;
use crate::database::query_builder::bind_params_query_as;
use crate::sql::{sql_for_partial_update, SqlParam};

const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

/// Request field names that differ from their column names
pub const USER_FIELD_MAP: &[(&str, &str)] = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// A user together with the ids of the jobs they applied to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub jobs: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(FromRow)]
struct UserCredentials {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
    is_admin: bool,
}

impl User {
    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, UserCredentials>(
            "SELECT username, password, first_name, last_name, email, is_admin FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = row {
            if verify_password(password, &row.password)? {
                return Ok(User {
                    username: row.username,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: row.email,
                    is_admin: row.is_admin,
                });
            }
        }

        tracing::debug!("Failed login for user '{}'", username);
        Err(DatabaseError::Unauthorized("Invalid username/password".to_string()))
    }

    /// Fails with `BadRequest` on a duplicate username.
    pub async fn register(pool: &PgPool, new: &NewUser) -> Result<User, DatabaseError> {
        let existing = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(&new.username)
            .fetch_optional(pool)
            .await?;

        if existing.is_some() {
            return Err(DatabaseError::BadRequest(format!("Duplicate username: {}", new.username)));
        }

        let hashed = hash_password(&new.password)?;
        let sql = format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(hashed)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(new.is_admin)
            .fetch_one(pool)
            .await?;

        tracing::info!("Registered user {} (admin: {})", user.username, user.is_admin);
        Ok(user)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
    }

    pub async fn get(pool: &PgPool, username: &str) -> Result<UserDetail, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;

        let jobs = sqlx::query_scalar::<_, i32>(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(UserDetail { user, jobs })
    }

    /// Partial update. A supplied password is hashed before it is stored.
    pub async fn update(pool: &PgPool, username: &str, data: &[(&str, SqlParam)]) -> Result<User, DatabaseError> {
        let mut data = data.to_vec();
        for (field, value) in data.iter_mut() {
            if *field == "password" {
                if let SqlParam::Text(Some(plain)) = value {
                    let hashed = hash_password(plain)?;
                    *value = SqlParam::Text(Some(hashed));
                }
            }
        }

        let set = sql_for_partial_update(&data, USER_FIELD_MAP)?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {}",
            set.query,
            set.params.len() + 1,
            USER_COLUMNS
        );

        bind_params_query_as(sqlx::query_as::<_, User>(&sql), &set.params)
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))
    }

    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), DatabaseError> {
        let deleted = sqlx::query_scalar::<_, String>("DELETE FROM users WHERE username = $1 RETURNING username")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("No user: {}", username))),
        }
    }

    /// Record that a user applied to a job. Applying twice is a `BadRequest`.
    pub async fn apply_to_job(pool: &PgPool, username: &str, job_id: i32) -> Result<(), DatabaseError> {
        let job = sqlx::query_scalar::<_, i32>("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await?;
        if job.is_none() {
            return Err(DatabaseError::NotFound(format!("No job: {}", job_id)));
        }

        let user = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        if user.is_none() {
            return Err(DatabaseError::NotFound(format!("No username: {}", username)));
        }

        sqlx::query("INSERT INTO applications (job_id, username) VALUES ($1, $2)")
            .bind(job_id)
            .bind(username)
            .execute(pool)
            .await?;

        tracing::info!("User {} applied to job {}", username, job_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_without_password() {
        let user = User {
            username: "u1".into(),
            first_name: "U1F".into(),
            last_name: "U1L".into(),
            email: "user1@user.com".into(),
            is_admin: false,
        };
        let value = serde_json::to_value(UserDetail { user, jobs: vec![3] }).unwrap();
        assert_eq!(value["firstName"], "U1F");
        assert_eq!(value["isAdmin"], false);
        assert_eq!(value["jobs"][0], 3);
        assert!(value.get("password").is_none());
    }

    #[test]
    fn new_user_defaults_to_non_admin() {
        let new: NewUser = serde_json::from_value(serde_json::json!({
            "username": "new",
            "password": "password",
            "firstName": "F",
            "lastName": "L",
            "email": "new@email.com"
        }))
        .unwrap();
        assert!(!new.is_admin);
    }
}
