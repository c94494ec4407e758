use serde::Serialize;

/// A typed, nullable value bound to a positional placeholder.
///
/// Each variant carries an `Option` so that a SQL `NULL` is still sent with a
/// concrete parameter type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(Option<String>),
    Int(Option<i32>),
    Float(Option<f64>),
    Bool(Option<bool>),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(Some(value.to_string()))
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(Some(value))
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Int(Some(value))
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(Some(value))
    }
}

/// Ordered `(field name, value)` pairs for a partial update.
pub type UpdatePayload = Vec<(&'static str, SqlParam)>;

/// `(domain field name, column name)` pairs. Names not listed pass through unchanged.
pub type FieldNameMap<'a> = &'a [(&'a str, &'a str)];

/// SQL text plus the values for its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

impl SqlResult {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Declared type of a filter value, used to coerce query-string input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    Integer,
    Flag,
}

impl FilterKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FilterKind::Text => "a string",
            FilterKind::Integer => "a non-negative integer",
            FilterKind::Flag => "true or false",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i32),
    Flag(bool),
}

impl FilterValue {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Text,
            FilterValue::Integer(_) => FilterKind::Integer,
            FilterValue::Flag(_) => FilterKind::Flag,
        }
    }
}

/// How a recognized filter key turns into a WHERE fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterClause {
    /// `"<column>" ILIKE $n`, bound to `%value%`
    Contains { column: &'static str },
    /// `"<column>" <op> $n`
    Compare { column: &'static str, op: &'static str },
    /// Literal SQL when the flag is true, nothing when false. Never bound.
    Flag { sql: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRule {
    pub key: &'static str,
    pub kind: FilterKind,
    pub clause: FilterClause,
}
