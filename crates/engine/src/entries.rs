//! Ledger entries.
//!
//! A [`LedgerEntry`] is the immutable record of one balance-affecting event.
//! The log is append-only: entries are never updated or deleted, and an
//! account's balance is always the signed sum of its entries.
//!
//! Amounts are stored as positive integer **minor units** (cents); the sign
//! applied to the balance comes from the [`EntryKind`]:
//! - `credit` / `transfer_in` increase the balance
//! - `debit` / `transfer_out` decrease it
//!
//! Transfer legs carry the counterparty account, and the `transfer_in` leg
//! points back at its `transfer_out` leg via `reference_entry_id`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Credit,
    Debit,
    TransferIn,
    TransferOut,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
        }
    }

    /// Applies the kind's sign to a positive entry amount.
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Credit | Self::TransferIn => amount_minor,
            Self::Debit | Self::TransferOut => -amount_minor,
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "transfer_in" => Ok(Self::TransferIn),
            "transfer_out" => Ok(Self::TransferOut),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: EntryKind,
    /// Always positive; see [`EntryKind::signed`].
    pub amount_minor: i64,
    pub description: Option<String>,
    /// The other account of a transfer leg.
    pub counterparty_account_id: Option<Uuid>,
    /// On `transfer_in` legs, the id of the paired `transfer_out` entry.
    pub reference_entry_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub(crate) fn new(
        account_id: Uuid,
        kind: EntryKind,
        amount_minor: i64,
        description: Option<String>,
        counterparty_account_id: Option<Uuid>,
        reference_entry_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount_minor,
            description,
            counterparty_account_id,
            reference_entry_id,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub counterparty_account_id: Option<String>,
    pub reference_entry_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount_minor),
            description: ActiveValue::Set(entry.description.clone()),
            counterparty_account_id: ActiveValue::Set(
                entry.counterparty_account_id.map(|id| id.to_string()),
            ),
            reference_entry_id: ActiveValue::Set(
                entry.reference_entry_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("entry not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            counterparty_account_id: model
                .counterparty_account_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            reference_entry_id: model
                .reference_entry_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: model.created_at,
        })
    }
}
