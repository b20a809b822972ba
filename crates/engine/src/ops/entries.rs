//! Transaction log read operations.

use uuid::Uuid;

use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, LedgerEntry, ResultEngine, accounts, entries};

use super::Engine;

/// Page size applied when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Hard cap on the page size a caller may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// One page of an account's entry history, newest first.
#[derive(Clone, Debug)]
pub struct EntriesPage {
    pub entries: Vec<LedgerEntry>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl Engine {
    /// Return a single ledger entry by id.
    pub async fn entry(&self, entry_id: Uuid) -> ResultEngine<LedgerEntry> {
        let model = entries::Entity::find_by_id(entry_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entry not exists".to_string()))?;
        LedgerEntry::try_from(model)
    }

    /// Return the entry whose `reference_entry_id` points at `reference_id`,
    /// i.e. the `transfer_in` leg paired with a `transfer_out` entry.
    pub async fn find_by_reference(&self, reference_id: Uuid) -> ResultEngine<LedgerEntry> {
        let model = entries::Entity::find()
            .filter(entries::Column::ReferenceEntryId.eq(reference_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entry not exists".to_string()))?;
        LedgerEntry::try_from(model)
    }

    /// List an account's entries, ordered by creation time descending.
    ///
    /// `page` is 1-based. `page_size` falls back to [`DEFAULT_PAGE_SIZE`] and
    /// is capped at [`MAX_PAGE_SIZE`]. The account must exist.
    pub async fn list_entries(
        &self,
        account_id: Uuid,
        page: u64,
        page_size: Option<u64>,
    ) -> ResultEngine<EntriesPage> {
        if page == 0 {
            return Err(EngineError::InvalidAmount(
                "page must be >= 1".to_string(),
            ));
        }
        let page_size = match page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(0) => {
                return Err(EngineError::InvalidAmount(
                    "page size must be > 0".to_string(),
                ));
            }
            Some(requested) => requested.min(MAX_PAGE_SIZE),
        };

        accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;

        let paginator = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(entries::Column::CreatedAt)
            // Entries created in the same instant (transfer legs) need a
            // stable tie-break.
            .order_by_desc(entries::Column::Id)
            .paginate(&self.database, page_size);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        let mut page_entries = Vec::with_capacity(models.len());
        for model in models {
            page_entries.push(LedgerEntry::try_from(model)?);
        }

        Ok(EntriesPage {
            entries: page_entries,
            total,
            page,
            page_size,
        })
    }
}
