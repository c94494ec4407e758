// handlers/mod.rs - Route handlers, one module per resource
//
// Authorization is applied by route layers in app.rs; handlers only see
// requests that already passed their policy.

pub mod auth;
pub mod companies;
pub mod jobs;
pub mod users;
