//! Command structs for engine write operations.
//!
//! These types group parameters for the mutating operations
//! (credit/debit/transfer), keeping call sites readable and avoiding long
//! argument lists.

use uuid::Uuid;

/// Credit an account.
#[derive(Clone, Debug)]
pub struct CreditCmd {
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
}

impl CreditCmd {
    #[must_use]
    pub fn new(account_id: Uuid, amount_minor: i64) -> Self {
        Self {
            account_id,
            amount_minor,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Debit an account. Fails if the balance would go negative.
#[derive(Clone, Debug)]
pub struct DebitCmd {
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
}

impl DebitCmd {
    #[must_use]
    pub fn new(account_id: Uuid, amount_minor: i64) -> Self {
        Self {
            account_id,
            amount_minor,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Move money between two distinct accounts as one atomic unit.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(sender_id: Uuid, recipient_id: Uuid, amount_minor: i64) -> Self {
        Self {
            sender_id,
            recipient_id,
            amount_minor,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
