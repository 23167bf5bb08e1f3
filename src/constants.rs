//! HTTP status catalog and standard response messages.

use axum::http::StatusCode;

/// Every status code the API answers with. Nothing outside this list is emitted.
pub const STATUS_CATALOG: [StatusCode; 10] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::NO_CONTENT,
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::CONFLICT,
    StatusCode::UNPROCESSABLE_ENTITY,
    StatusCode::INTERNAL_SERVER_ERROR,
];

pub fn in_catalog(status: StatusCode) -> bool {
    STATUS_CATALOG.contains(&status)
}

pub mod messages {
    pub const SUCCESS: &str = "Operation completed successfully";
    pub const CREATED: &str = "Resource created successfully";
    pub const UPDATED: &str = "Resource updated successfully";
    pub const DELETED: &str = "Resource deleted successfully";
    pub const BAD_REQUEST: &str = "Invalid request parameters";
    pub const UNAUTHORIZED: &str = "Authentication required";
    pub const FORBIDDEN: &str = "Access denied";
    pub const NOT_FOUND: &str = "Resource not found";
    pub const CONFLICT: &str = "Resource already exists";
    pub const VALIDATION_ERROR: &str = "Validation failed";
    pub const INTERNAL_ERROR: &str = "Internal server error";
    /// Used when a failure renders to an empty message.
    pub const UNEXPECTED: &str = "An unexpected error occurred";
}

/// Machine-readable code reported when a failure declares none.
pub const DEFAULT_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_holds_ten_distinct_codes() {
        let mut codes: Vec<u16> = STATUS_CATALOG.iter().map(|s| s.as_u16()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, vec![200, 201, 204, 400, 401, 403, 404, 409, 422, 500]);
    }

    #[test]
    fn statuses_outside_catalog_are_rejected() {
        assert!(in_catalog(StatusCode::CONFLICT));
        assert!(!in_catalog(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!in_catalog(StatusCode::TOO_MANY_REQUESTS));
    }
}
