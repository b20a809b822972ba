use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, Money};

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener};

mod accounts;
mod entries;
mod server;
mod transfers;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountCreated, AccountNew, BalanceResponse};
    }

    pub mod entry {
        pub use api_types::entry::{
            EntriesQuery, EntryCreated, EntryListResponse, EntryView, MovementNew,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{TransferCreated, TransferNew, TransferView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requested: Option<String>,
}

impl ErrorBody {
    fn message(error: String) -> Self {
        Self {
            error,
            current_balance: None,
            requested: None,
        }
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InsufficientBalance { .. }
        | EngineError::SameAccountTransfer => StatusCode::BAD_REQUEST,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorBody {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorBody::message("internal server error".to_string())
        }
        EngineError::InsufficientBalance {
            current_minor,
            requested_minor,
        } => ErrorBody {
            error: "insufficient balance".to_string(),
            current_balance: Some(Money::new(current_minor).to_string()),
            requested: Some(Money::new(requested_minor).to_string()),
        },
        other => ErrorBody::message(other.to_string()),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, ErrorBody::message(err)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses a decimal-string amount from a request body.
fn parse_amount(raw: &str) -> Result<Money, ServerError> {
    raw.parse::<Money>().map_err(ServerError::from)
}
