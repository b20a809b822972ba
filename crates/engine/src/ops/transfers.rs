//! Transfer resolution.
//!
//! A transfer is identified by its `transfer_out` leg; the paired
//! `transfer_in` leg is found through `reference_entry_id`. Under correct
//! operation the pair always exists, but a missing `transfer_in` leg must be
//! detectable rather than silently hidden, so the view carries an explicit
//! status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{QueryFilter, prelude::*};

use crate::{EngineError, EntryKind, ResultEngine, entries};

use super::Engine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Both legs are present.
    Completed,
    /// The `transfer_in` leg is missing. Must never arise under correct
    /// operation; surfaced so audits can catch it.
    Inconsistent,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Inconsistent => "inconsistent",
        }
    }
}

/// Reconstructed view of a transfer's paired legs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferView {
    pub transfer_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

impl Engine {
    /// Resolve a transfer by its canonical id (the `transfer_out` entry id).
    ///
    /// Ids that exist but do not name a `transfer_out` entry are reported as
    /// not found, the same as absent ids.
    pub async fn transfer_view(&self, transfer_id: Uuid) -> ResultEngine<TransferView> {
        let not_found = || EngineError::KeyNotFound("transfer not exists".to_string());

        let out_model = entries::Entity::find_by_id(transfer_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(not_found)?;
        let out_leg = crate::LedgerEntry::try_from(out_model)?;
        if out_leg.kind != EntryKind::TransferOut {
            return Err(not_found());
        }
        let recipient_id = out_leg.counterparty_account_id.ok_or_else(not_found)?;

        let in_model = entries::Entity::find()
            .filter(entries::Column::ReferenceEntryId.eq(transfer_id.to_string()))
            .one(&self.database)
            .await?;
        let status = if in_model.is_some() {
            TransferStatus::Completed
        } else {
            TransferStatus::Inconsistent
        };

        Ok(TransferView {
            transfer_id,
            sender_id: out_leg.account_id,
            recipient_id,
            amount_minor: out_leg.amount_minor,
            description: out_leg.description,
            status,
            created_at: out_leg.created_at,
        })
    }
}
