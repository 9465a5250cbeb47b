use serde::{Deserialize, Serialize};

use crate::device::SignInput;
use crate::models::{Validate, ValidationErrors};

/// A transaction input to sign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Hash of the unspent output being spent.
    pub hash: Option<String>,

    /// Index of the key that owns the output.
    pub index: Option<i64>,
}

impl Validate for TransactionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::default();
        errs.required("hash", "body", &self.hash);
        errs.required("index", "body", &self.index);
        if let Some(index) = self.index {
            if !(0..=i64::from(u32::MAX)).contains(&index) {
                errs.invalid("index", "body", "must be between 0 and 4294967295");
            }
        }
        errs.into_result()
    }
}

impl TryFrom<&TransactionInput> for SignInput {
    type Error = ValidationErrors;

    fn try_from(input: &TransactionInput) -> Result<Self, Self::Error> {
        input.validate()?;
        match (&input.hash, input.index) {
            (Some(hash), Some(index)) => Ok(SignInput {
                hash: hash.clone(),
                index: index as u32,
            }),
            _ => Err(ValidationErrors::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{from_json, to_json};

    #[test]
    fn test_both_missing_reports_both() {
        let input: TransactionInput = from_json(b"{}").unwrap();
        let errs = input.validate().unwrap_err();
        let names: Vec<_> = errs.0.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["hash", "index"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let input: TransactionInput = from_json(br#"{"hash": null, "index": 1}"#).unwrap();
        assert_eq!(input.validate().unwrap_err().to_string(), "hash in body is required");
    }

    #[test]
    fn test_valid_input_converts() {
        let input = TransactionInput {
            hash: Some("a1b2".into()),
            index: Some(7),
        };
        let sign: SignInput = (&input).try_into().unwrap();
        assert_eq!(sign.index, 7);

        let bytes = to_json(&input).unwrap();
        assert_eq!(from_json::<TransactionInput>(&bytes).unwrap(), input);
    }

    #[test]
    fn test_negative_index_rejected() {
        let input = TransactionInput {
            hash: Some("a1b2".into()),
            index: Some(-1),
        };
        assert!(input.validate().is_err());
    }
}
