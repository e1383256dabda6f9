use thiserror::Error;

use crate::domain::{Cents, CustomerId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Customer name must not be empty")]
    EmptyName,

    #[error("Purchase description must not be empty")]
    EmptyDescription,

    #[error("Credit limit must not be negative, got {0}")]
    NegativeLimit(Cents),

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Cents),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
