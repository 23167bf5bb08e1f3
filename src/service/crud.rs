//! CRUD request validation: merge request sources, check against a schema,
//! attach the caller's credential.

use super::credentials::{Credential, CredentialError, CredentialProvider};
use super::validation::{Schema, ValidationError};
use crate::error::AppError;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Operation kind, also used as the permission of a [`SecurityRule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub securable: String,
    pub permission: Operation,
}

impl SecurityRule {
    pub fn new(securable: impl Into<String>, permission: Operation) -> Self {
        SecurityRule {
            securable: securable.into(),
            permission,
        }
    }
}

/// The three request sources, as extracted from an HTTP request.
#[derive(Clone, Debug, Default)]
pub struct CrudRequest {
    pub params: Map<String, Value>,
    pub body: Map<String, Value>,
    pub query: Map<String, Value>,
    pub headers: HeaderMap,
}

impl CrudRequest {
    /// Flat candidate object. On key collision the later source wins:
    /// route params, then body, then query string.
    pub fn merged(&self) -> Map<String, Value> {
        let mut out = self.params.clone();
        out.extend(self.body.clone());
        out.extend(self.query.clone());
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidatedRequest {
    pub credential: Credential,
    pub params: Map<String, Value>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Exactly one of a validated request or the error that stopped it.
pub type ValidationOutcome = Result<ValidatedRequest, RequestError>;

/// Base for feature controllers. Every operation runs the same path; the
/// operation kind is carried for logging and future specialization.
#[derive(Clone)]
pub struct CrudController {
    rules: Vec<SecurityRule>,
    credentials: Arc<dyn CredentialProvider>,
}

impl CrudController {
    pub fn new(rules: Vec<SecurityRule>, credentials: Arc<dyn CredentialProvider>) -> Self {
        CrudController { rules, credentials }
    }

    pub fn security_rules(&self) -> &[SecurityRule] {
        &self.rules
    }

    /// Declared rules for one operation. Declared only: nothing here enforces them.
    pub fn rules_for(&self, operation: Operation) -> impl Iterator<Item = &SecurityRule> {
        self.rules.iter().filter(move |r| r.permission == operation)
    }

    pub async fn create(&self, request: &CrudRequest, schema: &dyn Schema) -> ValidationOutcome {
        self.validate_request(request, schema, Operation::Create).await
    }

    pub async fn read(&self, request: &CrudRequest, schema: &dyn Schema) -> ValidationOutcome {
        self.validate_request(request, schema, Operation::Read).await
    }

    pub async fn update(&self, request: &CrudRequest, schema: &dyn Schema) -> ValidationOutcome {
        self.validate_request(request, schema, Operation::Update).await
    }

    pub async fn delete(&self, request: &CrudRequest, schema: &dyn Schema) -> ValidationOutcome {
        self.validate_request(request, schema, Operation::Delete).await
    }

    async fn validate_request(
        &self,
        request: &CrudRequest,
        schema: &dyn Schema,
        operation: Operation,
    ) -> ValidationOutcome {
        let params = match schema.parse(request.merged()).await {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(?operation, issues = e.issues.len(), "request rejected by schema");
                return Err(e.into());
            }
        };
        let credential = self.credentials.credential(request).await?;
        tracing::debug!(?operation, account_id = credential.account_id, user_id = credential.user_id, "request validated");
        Ok(ValidatedRequest { credential, params })
    }
}
