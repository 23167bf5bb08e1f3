//! Request pipeline middleware.

mod error;
pub use error::{error_middleware, panic_response, FailureReport};
