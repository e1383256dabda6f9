use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Cents, Customer, CustomerId, HistoryEntry, HistoryKind, Payment, Purchase,
};

use super::MIGRATION_001_INITIAL;

/// Raw totals across the whole ledger, used to build global statistics.
#[derive(Debug, Clone)]
pub struct LedgerTotals {
    pub active_customers: i64,
    pub purchase_total: Cents,
    pub payment_total: Cents,
}

/// Repository for persisting and querying customers, purchases and payments.
/// Every operation is a single statement against the pool, so a crash
/// cannot leave one table updated and a dependent table stale.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Customer operations
    // ========================

    /// Save a new customer and assign its id.
    pub async fn save_customer(&self, customer: &mut Customer) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, phone, credit_limit_cents, active, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.credit_limit_cents)
        .bind(customer.active)
        .bind(customer.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save customer")?;

        customer.id = row.get("id");
        Ok(())
    }

    /// Replace a customer's mutable fields (name, phone, credit limit).
    /// A no-op when the id does not exist; callers are expected to have
    /// resolved the customer first.
    pub async fn update_customer(
        &self,
        id: CustomerId,
        name: &str,
        phone: Option<&str>,
        credit_limit_cents: Cents,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE customers
            SET name = ?, phone = ?, credit_limit_cents = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(credit_limit_cents)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update customer")?;
        Ok(())
    }

    /// Mark a customer inactive (soft delete). Idempotent, and silent on
    /// unknown ids.
    pub async fn deactivate_customer(&self, id: CustomerId) -> Result<()> {
        sqlx::query("UPDATE customers SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to deactivate customer")?;
        Ok(())
    }

    /// Get a customer by id, active or not.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, phone, credit_limit_cents, active, created_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch customer")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    /// List active customers whose name or phone contains the term
    /// (case-insensitive), ordered by name. An empty term lists all
    /// active customers.
    pub async fn find_customers(&self, term: &str) -> Result<Vec<Customer>> {
        let rows = if term.is_empty() {
            sqlx::query(
                r#"
                SELECT id, name, phone, credit_limit_cents, active, created_at
                FROM customers
                WHERE active = 1
                ORDER BY name
                "#,
            )
            .fetch_all(&self.pool)
            .await
        } else {
            let pattern = format!("%{}%", term);
            sqlx::query(
                r#"
                SELECT id, name, phone, credit_limit_cents, active, created_at
                FROM customers
                WHERE active = 1 AND (name LIKE ?1 OR phone LIKE ?1)
                ORDER BY name
                "#,
            )
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
        }
        .context("Failed to search customers")?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer> {
        let created_at_str: String = row.get("created_at");

        Ok(Customer {
            id: row.get("id"),
            name: row.get("name"),
            phone: row.get("phone"),
            credit_limit_cents: row.get("credit_limit_cents"),
            active: row.get::<i32, _>("active") != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Purchase operations
    // ========================

    /// Save a new purchase and assign its id.
    pub async fn save_purchase(&self, purchase: &mut Purchase) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO purchases (customer_id, description, amount_cents, timestamp, settled)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(purchase.customer_id)
        .bind(&purchase.description)
        .bind(purchase.amount_cents)
        .bind(purchase.timestamp.to_rfc3339())
        .bind(purchase.settled)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save purchase")?;

        purchase.id = row.get("id");
        Ok(())
    }

    /// List a customer's purchases, most recent first.
    pub async fn list_purchases_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Purchase>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, description, amount_cents, timestamp, settled
            FROM purchases
            WHERE customer_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list purchases")?;

        rows.iter().map(Self::row_to_purchase).collect()
    }

    fn row_to_purchase(row: &sqlx::sqlite::SqliteRow) -> Result<Purchase> {
        let timestamp_str: String = row.get("timestamp");

        Ok(Purchase {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            description: row.get("description"),
            amount_cents: row.get("amount_cents"),
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .context("Invalid timestamp")?
                .with_timezone(&Utc),
            settled: row.get::<i32, _>("settled") != 0,
        })
    }

    // ========================
    // Payment operations
    // ========================

    /// Save a new payment and assign its id.
    pub async fn save_payment(&self, payment: &mut Payment) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO payments (customer_id, amount_cents, note, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(payment.customer_id)
        .bind(payment.amount_cents)
        .bind(&payment.note)
        .bind(payment.timestamp.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save payment")?;

        payment.id = row.get("id");
        Ok(())
    }

    /// List a customer's payments, most recent first.
    pub async fn list_payments_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, amount_cents, note, timestamp
            FROM payments
            WHERE customer_id = ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment> {
        let timestamp_str: String = row.get("timestamp");

        Ok(Payment {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            amount_cents: row.get("amount_cents"),
            note: row.get("note"),
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .context("Invalid timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Balance and history
    // ========================

    /// Net position for one customer using SQL aggregation: unsettled
    /// purchases minus payments, unfloored. The caller applies the
    /// zero floor.
    pub async fn compute_balance(&self, customer_id: CustomerId) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE((SELECT SUM(amount_cents) FROM purchases
                          WHERE customer_id = ?1 AND settled = 0), 0) -
                COALESCE((SELECT SUM(amount_cents) FROM payments
                          WHERE customer_id = ?1), 0) as balance
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute balance")?;

        Ok(row.get("balance"))
    }

    /// Net positions for all customers in a single query, unfloored.
    /// Customers with no records won't be in the map.
    pub async fn compute_all_balances(&self) -> Result<HashMap<CustomerId, Cents>> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, SUM(amount) as balance
            FROM (
                SELECT customer_id, amount_cents as amount
                FROM purchases WHERE settled = 0
                UNION ALL
                SELECT customer_id, -amount_cents as amount
                FROM payments
            )
            GROUP BY customer_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute all balances")?;

        let mut balances = HashMap::new();
        for row in rows {
            balances.insert(row.get("customer_id"), row.get("balance"));
        }

        Ok(balances)
    }

    /// Merge one customer's purchases and payments into a single trail,
    /// most recent first. Ties at equal timestamps order purchases before
    /// payments ('purchase' > 'payment'), then higher id first.
    pub async fn get_history(&self, customer_id: CustomerId) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT 'purchase' as kind, description, amount_cents, timestamp, id
            FROM purchases WHERE customer_id = ?1
            UNION ALL
            SELECT 'payment' as kind, note as description, amount_cents, timestamp, id
            FROM payments WHERE customer_id = ?1
            ORDER BY timestamp DESC, kind DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch history")?;

        rows.iter()
            .map(|row| {
                let kind_str: String = row.get("kind");
                let timestamp_str: String = row.get("timestamp");

                Ok(HistoryEntry {
                    kind: HistoryKind::from_str(&kind_str)
                        .ok_or_else(|| anyhow::anyhow!("Invalid history kind: {}", kind_str))?,
                    description: row.get("description"),
                    amount_cents: row.get("amount_cents"),
                    timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                        .context("Invalid timestamp")?
                        .with_timezone(&Utc),
                })
            })
            .collect()
    }

    /// Raw totals for global statistics.
    pub async fn get_ledger_totals(&self) -> Result<LedgerTotals> {
        let active_customers: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM customers WHERE active = 1")
                .fetch_one(&self.pool)
                .await
                .context("Failed to count active customers")?
                .get("count");

        let purchase_total: Cents = sqlx::query(
            "SELECT COALESCE(SUM(amount_cents), 0) as total FROM purchases WHERE settled = 0",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum purchases")?
        .get("total");

        let payment_total: Cents =
            sqlx::query("SELECT COALESCE(SUM(amount_cents), 0) as total FROM payments")
                .fetch_one(&self.pool)
                .await
                .context("Failed to sum payments")?
                .get("total");

        Ok(LedgerTotals {
            active_customers,
            purchase_total,
            payment_total,
        })
    }
}
