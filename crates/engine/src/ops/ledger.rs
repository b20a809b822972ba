//! Ledger write operations: credit, debit, transfer.
//!
//! Every operation here is a single atomic unit of work. All balance reads
//! that feed a decision happen inside the same database transaction as the
//! writes they guard, so two concurrent debits cannot both read a stale
//! balance and drive the account negative.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    CreditCmd, DebitCmd, EngineError, EntryKind, LedgerEntry, Money, ResultEngine, TransferCmd,
    entries,
};

use super::{Engine, normalize_optional_text, with_tx};

/// Outcome of a credit or debit: the appended entry plus the balance it
/// produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub kind: EntryKind,
    pub amount_minor: i64,
    pub new_balance_minor: i64,
}

/// Outcome of a completed transfer.
///
/// The `transfer_out` leg's id is the canonical transfer id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: Uuid,
    pub sender_entry_id: Uuid,
    pub recipient_entry_id: Uuid,
    pub amount_minor: i64,
    pub sender_new_balance_minor: i64,
    pub recipient_new_balance_minor: i64,
}

fn ensure_positive_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn checked_balance_add(balance_minor: i64, delta_minor: i64) -> ResultEngine<i64> {
    Money::new(balance_minor)
        .checked_add(Money::new(delta_minor))
        .map(Money::cents)
        .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))
}

fn checked_balance_sub(balance_minor: i64, delta_minor: i64) -> ResultEngine<i64> {
    Money::new(balance_minor)
        .checked_sub(Money::new(delta_minor))
        .map(Money::cents)
        .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))
}

impl Engine {
    /// Append one `credit` entry and increase the balance by `amount`.
    pub async fn credit(&self, cmd: CreditCmd) -> ResultEngine<PostedEntry> {
        let CreditCmd {
            account_id,
            amount_minor,
            description,
        } = cmd;
        ensure_positive_amount(amount_minor)?;
        let description = normalize_optional_text(description.as_deref());

        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id).await?;
            let new_balance = checked_balance_add(account.balance_minor, amount_minor)?;

            let entry = LedgerEntry::new(
                account_id,
                EntryKind::Credit,
                amount_minor,
                description,
                None,
                None,
                Utc::now(),
            )?;
            self.append_entry(&db_tx, &entry).await?;
            self.set_balance(&db_tx, account_id, new_balance, entry.created_at)
                .await?;

            Ok(PostedEntry {
                entry_id: entry.id,
                account_id,
                kind: EntryKind::Credit,
                amount_minor,
                new_balance_minor: new_balance,
            })
        })
    }

    /// Append one `debit` entry and decrease the balance by `amount`.
    ///
    /// Fails with [`EngineError::InsufficientBalance`] when the account does
    /// not cover the requested amount; the error reports both values.
    pub async fn debit(&self, cmd: DebitCmd) -> ResultEngine<PostedEntry> {
        let DebitCmd {
            account_id,
            amount_minor,
            description,
        } = cmd;
        ensure_positive_amount(amount_minor)?;
        let description = normalize_optional_text(description.as_deref());

        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id).await?;
            if account.balance_minor < amount_minor {
                return Err(EngineError::InsufficientBalance {
                    current_minor: account.balance_minor,
                    requested_minor: amount_minor,
                });
            }
            let new_balance = checked_balance_sub(account.balance_minor, amount_minor)?;

            let entry = LedgerEntry::new(
                account_id,
                EntryKind::Debit,
                amount_minor,
                description,
                None,
                None,
                Utc::now(),
            )?;
            self.append_entry(&db_tx, &entry).await?;
            self.set_balance(&db_tx, account_id, new_balance, entry.created_at)
                .await?;

            Ok(PostedEntry {
                entry_id: entry.id,
                account_id,
                kind: EntryKind::Debit,
                amount_minor,
                new_balance_minor: new_balance,
            })
        })
    }

    /// Move money between two accounts as one atomic unit.
    ///
    /// Appends the `transfer_out` leg on the sender, the `transfer_in` leg on
    /// the recipient (linked back via `reference_entry_id`), and applies both
    /// balance updates — all inside a single transaction. A failure at any
    /// point leaves no trace: no half-written transfer is ever observable.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        let TransferCmd {
            sender_id,
            recipient_id,
            amount_minor,
            description,
        } = cmd;
        if sender_id == recipient_id {
            return Err(EngineError::SameAccountTransfer);
        }
        ensure_positive_amount(amount_minor)?;
        let description = normalize_optional_text(description.as_deref());

        with_tx!(self, |db_tx| {
            // Rows are loaded (and later updated) in ascending account-id
            // order; see `require_account_pair`.
            let (sender, recipient) = self
                .require_account_pair(&db_tx, sender_id, recipient_id)
                .await?;

            if sender.balance_minor < amount_minor {
                return Err(EngineError::InsufficientBalance {
                    current_minor: sender.balance_minor,
                    requested_minor: amount_minor,
                });
            }
            let sender_new_balance = checked_balance_sub(sender.balance_minor, amount_minor)?;
            let recipient_new_balance =
                checked_balance_add(recipient.balance_minor, amount_minor)?;

            let now = Utc::now();
            let out_leg = LedgerEntry::new(
                sender_id,
                EntryKind::TransferOut,
                amount_minor,
                description.clone(),
                Some(recipient_id),
                None,
                now,
            )?;
            let in_leg = LedgerEntry::new(
                recipient_id,
                EntryKind::TransferIn,
                amount_minor,
                description,
                Some(sender_id),
                Some(out_leg.id),
                now,
            )?;

            self.append_entry(&db_tx, &out_leg).await?;
            self.append_entry(&db_tx, &in_leg).await?;

            let mut balance_updates = [
                (sender_id, sender_new_balance),
                (recipient_id, recipient_new_balance),
            ];
            balance_updates.sort_by_key(|(id, _)| id.to_string());
            for (account_id, new_balance) in balance_updates {
                self.set_balance(&db_tx, account_id, new_balance, now)
                    .await?;
            }

            Ok(TransferReceipt {
                transfer_id: out_leg.id,
                sender_entry_id: out_leg.id,
                recipient_entry_id: in_leg.id,
                amount_minor,
                sender_new_balance_minor: sender_new_balance,
                recipient_new_balance_minor: recipient_new_balance,
            })
        })
    }

    /// Append an entry to the transaction log. The log is append-only; no
    /// code path updates or deletes entry rows.
    pub(super) async fn append_entry(
        &self,
        db_tx: &DatabaseTransaction,
        entry: &LedgerEntry,
    ) -> ResultEngine<()> {
        entries::ActiveModel::from(entry).insert(db_tx).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::{ConnectOptions, Database};

    async fn engine_with_db() -> Engine {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_after_rollback() {
        let engine = engine_with_db().await;
        let sender = engine.create_account(10_000).await.unwrap();
        let recipient = engine.create_account(0).await.unwrap();

        // Stage the first transfer leg and the sender balance update, then
        // drop the transaction instead of committing: this simulates a
        // failure between the two leg writes.
        let db_tx = engine.database.begin().await.unwrap();
        let out_leg = LedgerEntry::new(
            sender.id,
            EntryKind::TransferOut,
            2_500,
            None,
            Some(recipient.id),
            None,
            Utc::now(),
        )
        .unwrap();
        engine.append_entry(&db_tx, &out_leg).await.unwrap();
        engine
            .set_balance(&db_tx, sender.id, 7_500, out_leg.created_at)
            .await
            .unwrap();
        db_tx.rollback().await.unwrap();

        assert_eq!(
            engine.entry(out_leg.id).await,
            Err(EngineError::KeyNotFound("entry not exists".to_string()))
        );
        let sender_after = engine.account(sender.id).await.unwrap();
        assert_eq!(sender_after.balance_minor, 10_000);
        let recipient_after = engine.account(recipient.id).await.unwrap();
        assert_eq!(recipient_after.balance_minor, 0);
    }
}
