use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, CustomerId};

pub type PurchaseId = i64;
pub type PaymentId = i64;

/// A sale on credit. Purchases are append-only; corrections are made by
/// recording payments, never by editing the purchase row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    /// Auto-assigned by the repository on save; 0 until then.
    pub id: PurchaseId,
    pub customer_id: CustomerId,
    pub description: String,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// When the sale happened; callers may backdate.
    pub timestamp: DateTime<Utc>,
    /// Persisted and consulted by balance queries, but no operation sets it.
    /// Kept as-is so every purchase counts toward the balance.
    pub settled: bool,
}

impl Purchase {
    pub fn new(
        customer_id: CustomerId,
        description: String,
        amount_cents: Cents,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0, // Will be set by repository
            customer_id,
            description,
            amount_cents,
            timestamp,
            settled: false,
        }
    }
}

/// A payment toward a customer's outstanding balance. Paying more than is
/// owed is allowed; the balance computation floors at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Auto-assigned by the repository on save; 0 until then.
    pub id: PaymentId,
    pub customer_id: CustomerId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Payment {
    pub fn new(customer_id: CustomerId, amount_cents: Cents, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: 0, // Will be set by repository
            customer_id,
            amount_cents,
            note: None,
            timestamp,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Purchase,
    Payment,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Purchase => "purchase",
            HistoryKind::Payment => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(HistoryKind::Purchase),
            "payment" => Some(HistoryKind::Payment),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a customer's merged audit trail. For payments the
/// description is the payment note, which may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub description: Option<String>,
    pub amount_cents: Cents,
    pub timestamp: DateTime<Utc>,
}
