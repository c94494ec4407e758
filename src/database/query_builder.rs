use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, Postgres};

use crate::sql::SqlParam;

pub type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// Bind builder output, in placeholder order, to a typed query.
pub fn bind_params_query_as<'q, O>(mut q: PgQueryAs<'q, O>, params: &[SqlParam]) -> PgQueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for p in params {
        q = match p {
            SqlParam::Text(v) => q.bind(v.clone()),
            SqlParam::Int(v) => q.bind(*v),
            SqlParam::Float(v) => q.bind(*v),
            SqlParam::Bool(v) => q.bind(*v),
        };
    }
    q
}

/// `SELECT <columns> FROM <table> [WHERE <clause>] ORDER BY <order>`, leaving
/// out `WHERE` when the clause is empty.
pub fn select_sql(columns: &str, table: &str, where_clause: &str, order_by: &str) -> String {
    let mut sql = format!("SELECT {} FROM {}", columns, table);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_clause);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(order_by);
    sql
}
