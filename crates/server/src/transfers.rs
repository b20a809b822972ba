//! Transfer API endpoints

use api_types::TransferStatus as ApiStatus;
use api_types::transfer::{TransferCreated, TransferNew, TransferView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Money, TransferCmd};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState};

fn map_status(status: engine::TransferStatus) -> ApiStatus {
    match status {
        engine::TransferStatus::Completed => ApiStatus::Completed,
        engine::TransferStatus::Inconsistent => ApiStatus::Inconsistent,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let amount = parse_amount(&payload.amount)?;

    let mut cmd = TransferCmd::new(payload.sender_id, payload.recipient_id, amount.cents());
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let receipt = state.engine.transfer(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferCreated {
            transfer_id: receipt.transfer_id,
            sender_entry_id: receipt.sender_entry_id,
            recipient_entry_id: receipt.recipient_entry_id,
            amount: Money::new(receipt.amount_minor).to_string(),
            sender_new_balance: Money::new(receipt.sender_new_balance_minor).to_string(),
            recipient_new_balance: Money::new(receipt.recipient_new_balance_minor).to_string(),
            status: ApiStatus::Completed,
        }),
    ))
}

pub async fn detail(
    State(state): State<ServerState>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferView>, ServerError> {
    let view = state.engine.transfer_view(transfer_id).await?;

    Ok(Json(TransferView {
        transfer_id: view.transfer_id,
        sender_id: view.sender_id,
        recipient_id: view.recipient_id,
        amount: Money::new(view.amount_minor).to_string(),
        description: view.description,
        status: map_status(view.status),
        created_at: view.created_at,
    }))
}
