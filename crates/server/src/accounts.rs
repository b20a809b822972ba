//! Account API endpoints

use api_types::account::{AccountCreated, AccountNew, BalanceResponse};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Money;
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountCreated>), ServerError> {
    let opening_balance = match payload.opening_balance.as_deref() {
        Some(raw) => parse_amount(raw)?,
        None => Money::ZERO,
    };

    let account = state.engine.create_account(opening_balance.cents()).await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            account_id: account.id,
            balance: Money::new(account.balance_minor).to_string(),
            created_at: account.created_at,
        }),
    ))
}

pub async fn balance(
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let account = state.engine.account(account_id).await?;

    Ok(Json(BalanceResponse {
        account_id: account.id,
        balance: Money::new(account.balance_minor).to_string(),
        last_updated: account.updated_at,
    }))
}
