pub mod extract;
pub mod schema;

pub use extract::ValidJson;
pub use schema::*;
