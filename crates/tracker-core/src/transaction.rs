//! Payment transactions recorded by staff.
//!
//! A transaction is not tied to any ticket; it records money moving to or
//! from a counterparty, who is either a tracker user or a free-text name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{TransactionId, UserId};
use crate::money::Money;

/// A recorded payment. Positive amounts are paid out to the counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier.
    pub id: TransactionId,
    /// Booking date.
    pub date: NaiveDate,
    /// Counterparty with an account.
    #[serde(default)]
    pub other: Option<UserId>,
    /// Counterparty without an account.
    #[serde(default)]
    pub other_text: String,
    /// Amount moved.
    pub amount: Money,
    /// Purpose of the payment.
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    /// Create a transaction. A counterparty must be named one way or the other.
    pub fn new(
        date: NaiveDate,
        other: Option<UserId>,
        other_text: impl Into<String>,
        amount: Money,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let other_text = other_text.into().trim().to_string();
        if other.is_none() && other_text.is_empty() {
            return Err(ValidationError::EmptyField("other"));
        }
        Ok(Self {
            id: TransactionId::new(),
            date,
            other,
            other_text,
            amount,
            description: description.into(),
        })
    }
}
