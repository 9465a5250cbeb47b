//! API request and response bodies.
//!
//! Required fields are `Option<T>` on the wire so that a missing field is
//! reported by `Validate` instead of failing deserialization. Every check
//! runs; the resulting `ValidationErrors` lists all missing fields.

pub mod requests;
pub mod transaction_input;
pub mod transaction_output;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

pub use requests::{
    CheckMessageSignatureRequest, GenerateAddressesRequest, SignMessageRequest,
    TransactionSignRequest,
};
pub use transaction_input::TransactionInput;
pub use transaction_output::TransactionOutput;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `transaction_inputs.0.hash`.
    pub name: String,
    /// Where the field was expected (`body`, `query`).
    pub location: &'static str,
    pub kind: FieldErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    Invalid(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Required => write!(f, "{} in {} is required", self.name, self.location),
            FieldErrorKind::Invalid(reason) => {
                write!(f, "{} in {} is invalid: {}", self.name, self.location, reason)
            }
        }
    }
}

/// All field errors collected while validating one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("validation failure list: (empty)"),
            1 => write!(f, "{}", self.0[0]),
            _ => {
                f.write_str("validation failure list:")?;
                for err in &self.0 {
                    write!(f, "\n{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record a required-field failure if `value` is `None`.
    pub fn required<T>(&mut self, name: impl Into<String>, location: &'static str, value: &Option<T>) {
        if value.is_none() {
            self.0.push(FieldError {
                name: name.into(),
                location,
                kind: FieldErrorKind::Required,
            });
        }
    }

    pub fn invalid(&mut self, name: impl Into<String>, location: &'static str, reason: impl Into<String>) {
        self.0.push(FieldError {
            name: name.into(),
            location,
            kind: FieldErrorKind::Invalid(reason.into()),
        });
    }

    /// Merge a nested value's errors under `prefix`.
    pub fn nest(&mut self, prefix: &str, nested: ValidationErrors) {
        for mut err in nested.0 {
            err.name = format!("{}.{}", prefix, err.name);
            self.0.push(err);
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Field-presence and range validation.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Serialize a model to JSON bytes.
pub fn to_json<T: Serialize>(model: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(model)
}

/// Deserialize a model from JSON bytes.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_error_message() {
        let mut errs = ValidationErrors::default();
        errs.required("hash", "body", &None::<String>);
        assert_eq!(errs.to_string(), "hash in body is required");
    }

    #[test]
    fn test_nested_names() {
        let mut inner = ValidationErrors::default();
        inner.required("index", "body", &None::<i64>);

        let mut outer = ValidationErrors::default();
        outer.nest("transaction_inputs.2", inner);
        assert_eq!(outer.0[0].name, "transaction_inputs.2.index");
    }
}
