//! Account store operations.
//!
//! A thin persistence facade: no business logic lives here. Balance writes
//! are only reachable from ledger operations that already hold a database
//! transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{Account, EngineError, EntryKind, LedgerEntry, ResultEngine, accounts};

use super::{Engine, with_tx};

impl Engine {
    /// Provision a new account with an opening balance.
    ///
    /// A non-zero opening balance is recorded as an initial `credit` entry,
    /// keeping the balance equal to the signed sum of the account's entries
    /// from the very first row.
    pub async fn create_account(&self, opening_balance_minor: i64) -> ResultEngine<Account> {
        if opening_balance_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "opening balance must be >= 0".to_string(),
            ));
        }
        let account = Account::new(opening_balance_minor, Utc::now());
        with_tx!(self, |db_tx| {
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            if opening_balance_minor > 0 {
                let entry = LedgerEntry::new(
                    account.id,
                    EntryKind::Credit,
                    opening_balance_minor,
                    Some("Opening balance".to_string()),
                    None,
                    None,
                    account.created_at,
                )?;
                self.append_entry(&db_tx, &entry).await?;
            }
            Ok::<_, EngineError>(())
        })?;
        Ok(account)
    }

    /// Return an account with its current balance.
    ///
    /// This is a plain read: it may observe a balance that a concurrent
    /// mutation is about to change, but never a partially-applied one.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// Load an account row inside the current transaction, failing if absent.
    pub(super) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Load two account rows inside the current transaction.
    ///
    /// Rows are fetched in ascending id order so that two opposite-direction
    /// transfers always touch the contended rows in the same order.
    pub(super) async fn require_account_pair(
        &self,
        db_tx: &DatabaseTransaction,
        first: Uuid,
        second: Uuid,
    ) -> ResultEngine<(accounts::Model, accounts::Model)> {
        let (low, high) = if first.to_string() <= second.to_string() {
            (first, second)
        } else {
            (second, first)
        };
        let low_model = self.require_account(db_tx, low).await?;
        let high_model = self.require_account(db_tx, high).await?;

        if low == first {
            Ok((low_model, high_model))
        } else {
            Ok((high_model, low_model))
        }
    }

    /// Persist a new balance for an account. Only callable from within a
    /// ledger transaction boundary.
    pub(super) async fn set_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        new_balance_minor: i64,
        updated_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let account_model = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            balance_minor: ActiveValue::Set(new_balance_minor),
            updated_at: ActiveValue::Set(updated_at),
            ..Default::default()
        };
        account_model.update(db_tx).await?;
        Ok(())
    }
}
