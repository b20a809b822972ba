//! Credit/debit and transaction-history API endpoints

use api_types::EntryKind as ApiKind;
use api_types::entry::{EntriesQuery, EntryCreated, EntryListResponse, EntryView, MovementNew};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreditCmd, DebitCmd, LedgerEntry, Money, PostedEntry};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState};

fn map_kind(kind: engine::EntryKind) -> ApiKind {
    match kind {
        engine::EntryKind::Credit => ApiKind::Credit,
        engine::EntryKind::Debit => ApiKind::Debit,
        engine::EntryKind::TransferIn => ApiKind::TransferIn,
        engine::EntryKind::TransferOut => ApiKind::TransferOut,
    }
}

fn map_entry(entry: LedgerEntry) -> EntryView {
    EntryView {
        id: entry.id,
        account_id: entry.account_id,
        kind: map_kind(entry.kind),
        amount: Money::new(entry.amount_minor).to_string(),
        description: entry.description,
        counterparty_account_id: entry.counterparty_account_id,
        reference_entry_id: entry.reference_entry_id,
        created_at: entry.created_at,
    }
}

fn map_posted(posted: PostedEntry) -> EntryCreated {
    EntryCreated {
        entry_id: posted.entry_id,
        account_id: posted.account_id,
        amount: Money::new(posted.amount_minor).to_string(),
        new_balance: Money::new(posted.new_balance_minor).to_string(),
        kind: map_kind(posted.kind),
    }
}

pub async fn credit(
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<MovementNew>,
) -> Result<(StatusCode, Json<EntryCreated>), ServerError> {
    let amount = parse_amount(&payload.amount)?;

    let mut cmd = CreditCmd::new(account_id, amount.cents());
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let posted = state.engine.credit(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_posted(posted))))
}

pub async fn debit(
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<MovementNew>,
) -> Result<(StatusCode, Json<EntryCreated>), ServerError> {
    let amount = parse_amount(&payload.amount)?;

    let mut cmd = DebitCmd::new(account_id, amount.cents());
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let posted = state.engine.debit(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_posted(posted))))
}

pub async fn list(
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let page = query.page.unwrap_or(1);

    let entries_page = state
        .engine
        .list_entries(account_id, page, query.page_size)
        .await?;

    Ok(Json(EntryListResponse {
        entries: entries_page.entries.into_iter().map(map_entry).collect(),
        total: entries_page.total,
        page: entries_page.page,
        page_size: entries_page.page_size,
    }))
}

pub async fn detail(
    State(state): State<ServerState>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state.engine.entry(entry_id).await?;
    Ok(Json(map_entry(entry)))
}
