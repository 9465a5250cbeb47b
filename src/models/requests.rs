//! Request bodies for the device endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{TransactionInput, TransactionOutput, Validate, ValidationErrors};

/// Upper bound on inputs or outputs in a single signing request.
pub const MAX_TRANSACTION_ENTRIES: usize = 8;

/// Upper bound on addresses generated per request.
pub const MAX_ADDRESSES: u32 = 99;

/// `POST /api/v1/generate_addresses`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAddressesRequest {
    /// Number of addresses to generate.
    pub address_n: Option<u32>,
    #[serde(default)]
    pub start_index: u32,
    #[serde(default)]
    pub confirm_address: bool,
}

impl Validate for GenerateAddressesRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::default();
        errs.required("address_n", "body", &self.address_n);
        if let Some(n) = self.address_n {
            if n == 0 || n > MAX_ADDRESSES {
                errs.invalid("address_n", "body", format!("must be between 1 and {}", MAX_ADDRESSES));
            }
        }
        errs.into_result()
    }
}

/// `POST /api/v1/sign_message`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageRequest {
    pub address_index: Option<u32>,
    pub message: Option<String>,
}

impl Validate for SignMessageRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::default();
        errs.required("address_index", "body", &self.address_index);
        errs.required("message", "body", &self.message);
        errs.into_result()
    }
}

/// `POST /api/v1/check_message_signature`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMessageSignatureRequest {
    pub address: Option<String>,
    pub message: Option<String>,
    pub signature: Option<String>,
}

impl Validate for CheckMessageSignatureRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::default();
        errs.required("address", "body", &self.address);
        errs.required("message", "body", &self.message);
        errs.required("signature", "body", &self.signature);
        errs.into_result()
    }
}

/// `POST /api/v1/transaction_sign`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignRequest {
    pub transaction_inputs: Option<Vec<TransactionInput>>,
    pub transaction_outputs: Option<Vec<TransactionOutput>>,
}

impl Validate for TransactionSignRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::default();
        errs.required("transaction_inputs", "body", &self.transaction_inputs);
        errs.required("transaction_outputs", "body", &self.transaction_outputs);

        if let Some(inputs) = &self.transaction_inputs {
            check_len(&mut errs, "transaction_inputs", inputs.len());
            for (i, input) in inputs.iter().enumerate() {
                if let Err(nested) = input.validate() {
                    errs.nest(&format!("transaction_inputs.{}", i), nested);
                }
            }
        }
        if let Some(outputs) = &self.transaction_outputs {
            check_len(&mut errs, "transaction_outputs", outputs.len());
            for (i, output) in outputs.iter().enumerate() {
                if let Err(nested) = output.validate() {
                    errs.nest(&format!("transaction_outputs.{}", i), nested);
                }
            }
        }
        errs.into_result()
    }
}

fn check_len(errs: &mut ValidationErrors, name: &str, len: usize) {
    if len == 0 || len > MAX_TRANSACTION_ENTRIES {
        errs.invalid(
            name,
            "body",
            format!("must contain between 1 and {} entries", MAX_TRANSACTION_ENTRIES),
        );
    }
}
