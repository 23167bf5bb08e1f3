//! Request validation services: schemas, the shared field-rule catalog, the CRUD
//! controller and caller credentials.

mod credentials;
mod crud;
mod validation;
pub mod validators;

pub use credentials::{Credential, CredentialError, CredentialProvider, HeaderCredentials, ACCOUNT_ID_HEADER, USER_ID_HEADER};
pub use crud::{CrudController, CrudRequest, Operation, RequestError, SecurityRule, ValidatedRequest, ValidationOutcome};
pub use validation::{FieldIssue, FieldRule, ObjectSchema, Refinement, Schema, ValidationError};
