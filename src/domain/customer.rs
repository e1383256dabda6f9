use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

pub type CustomerId = i64;

/// A customer of the shop who is trusted with informal credit.
/// Customers are never physically deleted, only deactivated, so purchase
/// and payment rows can always resolve their owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Auto-assigned by the repository on save; 0 until then.
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    /// Informational ceiling for how much credit to extend. Not enforced
    /// when recording purchases.
    pub credit_limit_cents: Cents,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, credit_limit_cents: Cents) -> Self {
        Self {
            id: 0, // Will be set by repository
            name,
            phone: None,
            credit_limit_cents,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
