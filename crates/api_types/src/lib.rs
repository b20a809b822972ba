//! Request/response types for the wallet ledger HTTP API.
//!
//! Field names are serialized in camelCase, entry kinds in
//! SCREAMING_SNAKE_CASE (`CREDIT`, `TRANSFER_OUT`, ...). Monetary amounts
//! travel as decimal strings (`"250.50"`), never as floats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Credit,
    Debit,
    TransferIn,
    TransferOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Completed,
    Inconsistent,
}

pub mod account {
    use super::*;

    /// Request body for provisioning an account.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountNew {
        /// Decimal string; defaults to `"0.00"` when omitted.
        #[serde(default)]
        pub opening_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountCreated {
        pub account_id: Uuid,
        pub balance: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BalanceResponse {
        pub account_id: Uuid,
        pub balance: String,
        pub last_updated: DateTime<Utc>,
    }
}

pub mod entry {
    use super::*;

    /// Request body shared by credit and debit.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MovementNew {
        /// Decimal string, must be strictly positive.
        pub amount: String,
        #[serde(default)]
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryCreated {
        pub entry_id: Uuid,
        pub account_id: Uuid,
        pub amount: String,
        pub new_balance: String,
        pub kind: EntryKind,
    }

    /// Full detail of one ledger entry.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub kind: EntryKind,
        pub amount: String,
        pub description: Option<String>,
        pub counterparty_account_id: Option<Uuid>,
        pub reference_entry_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    /// Query string for the entry history endpoint.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntriesQuery {
        #[serde(default)]
        pub page: Option<u64>,
        #[serde(default)]
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
        pub total: u64,
        pub page: u64,
        pub page_size: u64,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferNew {
        pub sender_id: Uuid,
        pub recipient_id: Uuid,
        pub amount: String,
        #[serde(default)]
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferCreated {
        pub transfer_id: Uuid,
        pub sender_entry_id: Uuid,
        pub recipient_entry_id: Uuid,
        pub amount: String,
        pub sender_new_balance: String,
        pub recipient_new_balance: String,
        pub status: TransferStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransferView {
        pub transfer_id: Uuid,
        pub sender_id: Uuid,
        pub recipient_id: Uuid,
        pub amount: String,
        pub description: Option<String>,
        pub status: TransferStatus,
        pub created_at: DateTime<Utc>,
    }
}
