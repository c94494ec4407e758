use super::error::SqlError;
use super::types::{FilterClause, FilterKind, FilterRule, FilterValue, SqlParam, SqlResult};

pub static JOB_FILTERS: &[FilterRule] = &[
    FilterRule {
        key: "title",
        kind: FilterKind::Text,
        clause: FilterClause::Contains { column: "title" },
    },
    FilterRule {
        key: "minSalary",
        kind: FilterKind::Integer,
        clause: FilterClause::Compare { column: "salary", op: ">=" },
    },
    FilterRule {
        key: "hasEquity",
        kind: FilterKind::Flag,
        clause: FilterClause::Flag { sql: "\"equity\" > 0" },
    },
];

pub static COMPANY_FILTERS: &[FilterRule] = &[
    FilterRule {
        key: "nameLike",
        kind: FilterKind::Text,
        clause: FilterClause::Contains { column: "name" },
    },
    FilterRule {
        key: "minEmployees",
        kind: FilterKind::Integer,
        clause: FilterClause::Compare { column: "num_employees", op: ">=" },
    },
    FilterRule {
        key: "maxEmployees",
        kind: FilterKind::Integer,
        clause: FilterClause::Compare { column: "num_employees", op: "<=" },
    },
];

/// Ordered filter criteria, restricted to the keys of one rule table.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    rules: &'static [FilterRule],
    entries: Vec<(&'static FilterRule, FilterValue)>,
}

impl FilterCriteria {
    pub fn new(rules: &'static [FilterRule]) -> Self {
        Self { rules, entries: vec![] }
    }

    /// Parse a raw URL query string (`title=j&minSalary=20000`), keeping the
    /// order in which keys appear and coercing each value to its declared type.
    pub fn from_query(raw_query: &str, rules: &'static [FilterRule]) -> Result<Self, SqlError> {
        let mut criteria = Self::new(rules);
        for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()) {
            let rule = criteria.rule(&key)?;
            let value = coerce(rule, &value)?;
            criteria.push(&key, value)?;
        }
        Ok(criteria)
    }

    pub fn push(&mut self, key: &str, value: FilterValue) -> Result<&mut Self, SqlError> {
        let rule = self.rule(key)?;
        if value.kind() != rule.kind {
            return Err(SqlError::InvalidFilterValue {
                key: key.to_string(),
                value: format!("{:?}", value),
                expected: rule.kind.describe(),
            });
        }
        if self.entries.iter().any(|(r, _)| r.key == rule.key) {
            return Err(SqlError::DuplicateFilter(key.to_string()));
        }
        self.entries.push((rule, value));
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(r, _)| r.key == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rule(&self, key: &str) -> Result<&'static FilterRule, SqlError> {
        self.rules
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| SqlError::UnknownFilter(key.to_string()))
    }
}

fn coerce(rule: &FilterRule, raw: &str) -> Result<FilterValue, SqlError> {
    let invalid = || SqlError::InvalidFilterValue {
        key: rule.key.to_string(),
        value: raw.to_string(),
        expected: rule.kind.describe(),
    };
    match rule.kind {
        FilterKind::Text => {
            if raw.trim().is_empty() {
                return Err(invalid());
            }
            Ok(FilterValue::Text(raw.to_string()))
        }
        FilterKind::Integer => match raw.trim().parse::<i32>() {
            Ok(n) if n >= 0 => Ok(FilterValue::Integer(n)),
            _ => Err(invalid()),
        },
        FilterKind::Flag => match raw.trim() {
            "true" => Ok(FilterValue::Flag(true)),
            "false" => Ok(FilterValue::Flag(false)),
            _ => Err(invalid()),
        },
    }
}

/// Escape LIKE metacharacters so text filters match literally. Backslash is
/// the default LIKE escape character in PostgreSQL.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build a WHERE clause body (without the `WHERE` keyword) from filter criteria.
///
/// Placeholders are numbered from `$1` and advance only for bound values, so
/// a flag contributes no placeholder whether it is set or not. With no criteria
/// the result is empty, and the caller must leave out `WHERE` altogether.
pub fn build_filter_clause(criteria: &FilterCriteria) -> SqlResult {
    let mut fragments: Vec<String> = vec![];
    let mut params: Vec<SqlParam> = vec![];

    for (rule, value) in &criteria.entries {
        match (rule.clause, value) {
            (FilterClause::Contains { column }, FilterValue::Text(text)) => {
                params.push(SqlParam::Text(Some(format!("%{}%", escape_like(text)))));
                fragments.push(format!("\"{}\" ILIKE ${}", column, params.len()));
            }
            (FilterClause::Compare { column, op }, FilterValue::Integer(n)) => {
                params.push(SqlParam::Int(Some(*n)));
                fragments.push(format!("\"{}\" {} ${}", column, op, params.len()));
            }
            (FilterClause::Flag { sql }, FilterValue::Flag(true)) => {
                fragments.push(sql.to_string());
            }
            (FilterClause::Flag { .. }, FilterValue::Flag(false)) => {}
            (clause, value) => {
                // push() checks kinds against the rule table
                tracing::warn!("Skipping filter {:?} with mismatched value {:?}", clause, value);
            }
        }
    }

    SqlResult {
        query: fragments.join(" AND "),
        params,
    }
}
