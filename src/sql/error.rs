use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlError {
    #[error("No data")]
    NoData,

    #[error("Unrecognized filter: {0}")]
    UnknownFilter(String),

    #[error("Filter given more than once: {0}")]
    DuplicateFilter(String),

    #[error("Invalid value for filter '{key}': expected {expected}, got '{value}'")]
    InvalidFilterValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}
