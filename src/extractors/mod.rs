//! Request extractors.

mod crud_request;
