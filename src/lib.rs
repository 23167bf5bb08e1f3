//! API scaffold: versioned HTTP routing, CRUD request validation, uniform
//! response envelopes and stored-procedure access on PostgreSQL.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;

pub use config::{AppConfig, DatabaseConfig, RuntimeMode, ServerConfig};
pub use db::{db_request, Database, ExpectedReturn};
pub use error::{AppError, ConfigError, Failure};
pub use response::{error_response, success_created, success_no_content, success_ok, success_response, Envelope};
pub use routes::{build_app, build_app_with};
pub use service::{CrudController, CrudRequest, Operation, SecurityRule, ValidatedRequest, ValidationOutcome};
pub use state::AppState;
