//! The module contains the errors the engine can throw.
use sea_orm::DbErr;
use thiserror::Error;

use crate::Money;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error(
        "Insufficient balance: current {}, requested {}",
        Money::new(*current_minor),
        Money::new(*requested_minor)
    )]
    InsufficientBalance {
        current_minor: i64,
        requested_minor: i64,
    },
    #[error("sender and recipient account must differ")]
    SameAccountTransfer,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (
                Self::InsufficientBalance {
                    current_minor: a_cur,
                    requested_minor: a_req,
                },
                Self::InsufficientBalance {
                    current_minor: b_cur,
                    requested_minor: b_req,
                },
            ) => a_cur == b_cur && a_req == b_req,
            (Self::SameAccountTransfer, Self::SameAccountTransfer) => true,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
