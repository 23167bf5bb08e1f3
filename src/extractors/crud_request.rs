//! Build a [`CrudRequest`] from route parameters, JSON body, query string and headers.

use crate::error::AppError;
use crate::service::CrudRequest;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, FromRequest, FromRequestParts, Path, Query, Request},
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Route parameters and query values are kept as strings; schemas decide
/// whether to coerce them. An empty body counts as `{}`.
#[async_trait]
impl<S> FromRequest<S> for CrudRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let params = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, state).await {
            Ok(Path(p)) => strings_to_map(p),
            Err(PathRejection::MissingPathParams(_)) => Map::new(),
            Err(e) => return Err(AppError::BadRequest(e.body_text())),
        };
        let query = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
            Ok(Query(q)) => strings_to_map(q),
            Err(e) => return Err(AppError::BadRequest(e.body_text())),
        };
        let headers = parts.headers.clone();

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        Ok(CrudRequest {
            params,
            body: body_to_map(&bytes)?,
            query,
            headers,
        })
    }
}

fn strings_to_map(values: HashMap<String, String>) -> Map<String, Value> {
    values.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

fn body_to_map(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
    }
}
