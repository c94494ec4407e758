pub mod types;
pub mod sql_set;
pub mod sql_where;
pub mod error;

pub use types::*;
pub use error::SqlError;
pub use sql_set::sql_for_partial_update;
pub use sql_where::{build_filter_clause, FilterCriteria, COMPANY_FILTERS, JOB_FILTERS};
