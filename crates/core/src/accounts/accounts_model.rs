//! Account domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::accounts_constants::{is_valid_account_type, DEFAULT_ACCOUNT_TYPE};
use crate::{errors::ValidationError, Error, Result};

/// Domain model representing an account in the system.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub id: Option<String>,
    pub portfolio_id: String,
    pub name: String,
    #[serde(default = "default_account_type")]
    pub account_type: String,
    pub currency: String,
}

fn default_account_type() -> String {
    DEFAULT_ACCOUNT_TYPE.to_string()
}

impl NewAccount {
    /// Validates the new account data
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account name cannot be empty".to_string(),
            )));
        }
        if self.portfolio_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "portfolioId".to_string(),
            )));
        }
        if self.currency.trim().len() != 3 {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Currency '{}' is not a 3-letter code",
                self.currency
            ))));
        }
        if !is_valid_account_type(&self.account_type) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown account type '{}'",
                self.account_type
            ))));
        }
        Ok(())
    }
}
