use chrono::{DateTime, Utc};

use crate::domain::{
    build_statistics, Cents, Customer, CustomerId, HistoryEntry, Payment, Purchase, Statistics,
};
use crate::storage::Repository;

use super::{AppError, EventBus, LedgerEvent};

/// Application service providing high-level operations for the credit
/// ledger. This is the primary interface for any client (CLI, GUI, export).
pub struct LedgerService {
    repo: Repository,
    /// Limit applied when a customer is registered without an explicit one.
    /// Read at call time, so changing it never touches existing customers.
    default_credit_limit: Cents,
    events: EventBus,
}

/// One row of the debtor listing: an active customer and what they owe.
pub struct DebtorEntry {
    pub customer: Customer,
    pub balance_cents: Cents,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository, default_credit_limit: Cents) -> Self {
        Self {
            repo,
            default_credit_limit,
            events: EventBus::new(),
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, default_credit_limit: Cents) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, default_credit_limit))
    }

    /// Connect to an existing database.
    pub async fn connect(
        database_path: &str,
        default_credit_limit: Cents,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, default_credit_limit))
    }

    /// Change the limit used for registrations that omit one.
    pub fn set_default_credit_limit(&mut self, limit: Cents) {
        self.default_credit_limit = limit;
    }

    /// Register a listener for completed mutations.
    pub fn subscribe(&self, listener: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.events.subscribe(listener);
    }

    // ========================
    // Customer operations
    // ========================

    /// Register a new customer. The credit limit falls back to the
    /// configured default when omitted.
    pub async fn register_customer(
        &self,
        name: String,
        phone: Option<String>,
        credit_limit_cents: Option<Cents>,
    ) -> Result<Customer, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::EmptyName);
        }

        let limit = credit_limit_cents.unwrap_or(self.default_credit_limit);
        if limit < 0 {
            return Err(AppError::NegativeLimit(limit));
        }

        let mut customer = Customer::new(name, limit);
        if let Some(phone) = phone {
            customer = customer.with_phone(phone);
        }

        self.repo.save_customer(&mut customer).await?;
        self.events.emit(LedgerEvent::CustomerRegistered(customer.id));
        Ok(customer)
    }

    /// Replace a customer's mutable fields. Silently a no-op when the id
    /// is unknown: callers are expected to have resolved the customer
    /// beforehand, so absence is not treated as an error here.
    pub async fn update_customer(
        &self,
        id: CustomerId,
        name: String,
        phone: Option<String>,
        credit_limit_cents: Cents,
    ) -> Result<(), AppError> {
        if name.trim().is_empty() {
            return Err(AppError::EmptyName);
        }
        if credit_limit_cents < 0 {
            return Err(AppError::NegativeLimit(credit_limit_cents));
        }

        self.repo
            .update_customer(id, &name, phone.as_deref(), credit_limit_cents)
            .await?;
        self.events.emit(LedgerEvent::CustomerUpdated(id));
        Ok(())
    }

    /// Mark a customer inactive. Idempotent; never errors on unknown ids.
    pub async fn deactivate_customer(&self, id: CustomerId) -> Result<(), AppError> {
        self.repo.deactivate_customer(id).await?;
        self.events.emit(LedgerEvent::CustomerDeactivated(id));
        Ok(())
    }

    /// Search active customers by name or phone substring. An empty term
    /// returns all active customers, ordered by name.
    pub async fn find_customers(&self, term: &str) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.find_customers(term).await?)
    }

    /// Get a customer by id, active or not.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        self.repo
            .get_customer(id)
            .await?
            .ok_or(AppError::CustomerNotFound(id))
    }

    // ========================
    // Purchase and payment operations
    // ========================

    /// Record a sale on credit. The credit limit is informational and not
    /// enforced here.
    pub async fn add_purchase(
        &self,
        customer_id: CustomerId,
        description: String,
        amount_cents: Cents,
        timestamp: DateTime<Utc>,
    ) -> Result<Purchase, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(amount_cents));
        }
        if description.trim().is_empty() {
            return Err(AppError::EmptyDescription);
        }

        // Purchases must always resolve their owner.
        self.get_customer(customer_id).await?;

        let mut purchase = Purchase::new(customer_id, description, amount_cents, timestamp);
        self.repo.save_purchase(&mut purchase).await?;
        self.events.emit(LedgerEvent::PurchaseRecorded(customer_id));
        Ok(purchase)
    }

    /// Record a payment toward a customer's balance. No check against the
    /// current balance: overpayment is permitted and absorbed by the
    /// zero floor in `compute_balance`.
    pub async fn add_payment(
        &self,
        customer_id: CustomerId,
        amount_cents: Cents,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Payment, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(amount_cents));
        }

        self.get_customer(customer_id).await?;

        let mut payment = Payment::new(customer_id, amount_cents, timestamp);
        if let Some(note) = note {
            payment = payment.with_note(note);
        }
        self.repo.save_payment(&mut payment).await?;
        self.events.emit(LedgerEvent::PaymentRecorded(customer_id));
        Ok(payment)
    }

    /// List a customer's purchases, most recent first.
    pub async fn list_purchases(&self, customer_id: CustomerId) -> Result<Vec<Purchase>, AppError> {
        self.get_customer(customer_id).await?;
        Ok(self.repo.list_purchases_for_customer(customer_id).await?)
    }

    /// List a customer's payments, most recent first.
    pub async fn list_payments(&self, customer_id: CustomerId) -> Result<Vec<Payment>, AppError> {
        self.get_customer(customer_id).await?;
        Ok(self.repo.list_payments_for_customer(customer_id).await?)
    }

    // ========================
    // Balance, history and reporting
    // ========================

    /// Outstanding balance for one customer:
    /// max(0, unsettled purchases - payments).
    pub async fn compute_balance(&self, customer_id: CustomerId) -> Result<Cents, AppError> {
        self.get_customer(customer_id).await?;
        let net = self.repo.compute_balance(customer_id).await?;
        Ok(net.max(0))
    }

    /// Merged purchase/payment trail for one customer, most recent first.
    pub async fn get_history(&self, customer_id: CustomerId) -> Result<Vec<HistoryEntry>, AppError> {
        self.get_customer(customer_id).await?;
        Ok(self.repo.get_history(customer_id).await?)
    }

    /// Global statistics. The outstanding total floors once across the
    /// whole ledger, which intentionally differs from summing floored
    /// per-customer balances.
    pub async fn get_statistics(&self) -> Result<Statistics, AppError> {
        let totals = self.repo.get_ledger_totals().await?;
        Ok(build_statistics(
            totals.active_customers,
            totals.purchase_total,
            totals.payment_total,
        ))
    }

    /// Active customers who currently owe anything, in the same name
    /// order as `find_customers("")`.
    pub async fn list_customers_with_debt(&self) -> Result<Vec<DebtorEntry>, AppError> {
        let customers = self.repo.find_customers("").await?;
        let balances = self.repo.compute_all_balances().await?;

        Ok(customers
            .into_iter()
            .filter_map(|customer| {
                let net = balances.get(&customer.id).copied().unwrap_or(0);
                (net > 0).then_some(DebtorEntry {
                    customer,
                    balance_cents: net,
                })
            })
            .collect())
    }
}
