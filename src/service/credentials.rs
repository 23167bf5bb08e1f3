//! Caller identity for validated requests.

use super::crud::CrudRequest;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Header carrying the caller's account id. Default: `X-Account-Id`.
pub const ACCOUNT_ID_HEADER: &str = "X-Account-Id";
/// Header carrying the caller's user id. Default: `X-User-Id`.
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub account_id: i64,
    pub user_id: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("authentication required: missing {0} header")]
    Missing(&'static str),
    #[error("authentication required: {0} must be a positive integer")]
    Invalid(&'static str),
}

/// Resolves who is calling. Swap in a session- or token-backed provider once
/// authentication exists; the controller only sees this trait.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credential(&self, request: &CrudRequest) -> Result<Credential, CredentialError>;
}

/// Reads identity from `X-Account-Id` / `X-User-Id`, as set by a trusted gateway.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderCredentials;

#[async_trait]
impl CredentialProvider for HeaderCredentials {
    async fn credential(&self, request: &CrudRequest) -> Result<Credential, CredentialError> {
        Ok(Credential {
            account_id: positive_header(request, ACCOUNT_ID_HEADER)?,
            user_id: positive_header(request, USER_ID_HEADER)?,
        })
    }
}

fn positive_header(request: &CrudRequest, name: &'static str) -> Result<i64, CredentialError> {
    let raw = request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(CredentialError::Missing(name))?;
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CredentialError::Invalid(name)),
    }
}
