use serde::{Deserialize, Serialize};

use crate::device::SignOutput;
use crate::models::{Validate, ValidationErrors};

/// A transaction output to sign.
///
/// `coins` and `hours` are decimal strings as produced by wallets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: Option<String>,
    pub coins: Option<String>,
    pub hours: Option<String>,

    /// Set when the output pays back to one of the device's own addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_index: Option<u32>,
}

impl Validate for TransactionOutput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::default();
        errs.required("address", "body", &self.address);
        errs.required("coins", "body", &self.coins);
        errs.required("hours", "body", &self.hours);

        if let Some(coins) = &self.coins {
            if coins.parse::<u64>().is_err() {
                errs.invalid("coins", "body", "not an unsigned integer");
            }
        }
        if let Some(hours) = &self.hours {
            if hours.parse::<u64>().is_err() {
                errs.invalid("hours", "body", "not an unsigned integer");
            }
        }
        errs.into_result()
    }
}

impl TryFrom<&TransactionOutput> for SignOutput {
    type Error = ValidationErrors;

    fn try_from(output: &TransactionOutput) -> Result<Self, Self::Error> {
        output.validate()?;
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.parse::<u64>().ok());
        match (&output.address, parse(&output.coins), parse(&output.hours)) {
            (Some(address), Some(coins), Some(hours)) => Ok(SignOutput {
                address: address.clone(),
                coins,
                hours,
                address_index: output.address_index,
            }),
            _ => Err(ValidationErrors::default()),
        }
    }
}
