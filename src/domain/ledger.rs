use super::{Cents, HistoryEntry, HistoryKind, Payment, Purchase};

/// Compute a customer's outstanding balance from in-memory records.
/// Balance = sum of unsettled purchases - sum of payments, floored at zero:
/// overpayment is absorbed, never carried as credit.
pub fn outstanding_balance(purchases: &[Purchase], payments: &[Payment]) -> Cents {
    let owed: Cents = purchases
        .iter()
        .filter(|p| !p.settled)
        .map(|p| p.amount_cents)
        .sum();
    let paid: Cents = payments.iter().map(|p| p.amount_cents).sum();
    (owed - paid).max(0)
}

/// Merge one customer's purchases and payments into a single audit trail,
/// most recent first. Ties at equal timestamps order purchases before
/// payments, then higher id first, matching the repository's SQL ordering.
pub fn merge_history(purchases: &[Purchase], payments: &[Payment]) -> Vec<HistoryEntry> {
    let mut keyed: Vec<(HistoryEntry, i64)> = purchases
        .iter()
        .map(|p| {
            (
                HistoryEntry {
                    kind: HistoryKind::Purchase,
                    description: Some(p.description.clone()),
                    amount_cents: p.amount_cents,
                    timestamp: p.timestamp,
                },
                p.id,
            )
        })
        .chain(payments.iter().map(|p| {
            (
                HistoryEntry {
                    kind: HistoryKind::Payment,
                    description: p.note.clone(),
                    amount_cents: p.amount_cents,
                    timestamp: p.timestamp,
                },
                p.id,
            )
        }))
        .collect();

    keyed.sort_by(|(a, a_id), (b, b_id)| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.kind.as_str().cmp(a.kind.as_str()))
            .then_with(|| b_id.cmp(a_id))
    });

    keyed.into_iter().map(|(entry, _)| entry).collect()
}

/// Aggregate statistics across the whole ledger.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub active_customers: i64,
    /// max(0, total purchases - total payments), floored once globally.
    /// This intentionally differs from summing per-customer balances
    /// whenever any single customer has overpaid.
    pub total_outstanding_cents: Cents,
    pub total_purchases_cents: Cents,
    pub total_payments_cents: Cents,
}

/// Build the global statistics from raw totals. The floor is applied once
/// at the end, not per customer.
pub fn build_statistics(
    active_customers: i64,
    total_purchases_cents: Cents,
    total_payments_cents: Cents,
) -> Statistics {
    Statistics {
        active_customers,
        total_outstanding_cents: (total_purchases_cents - total_payments_cents).max(0),
        total_purchases_cents,
        total_payments_cents,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn purchase(id: i64, amount: Cents, minutes_ago: i64) -> Purchase {
        let mut p = Purchase::new(
            1,
            format!("item {}", id),
            amount,
            Utc::now() - Duration::minutes(minutes_ago),
        );
        p.id = id;
        p
    }

    fn payment(id: i64, amount: Cents, minutes_ago: i64) -> Payment {
        let mut p = Payment::new(1, amount, Utc::now() - Duration::minutes(minutes_ago));
        p.id = id;
        p
    }

    #[test]
    fn test_balance_empty() {
        assert_eq!(outstanding_balance(&[], &[]), 0);
    }

    #[test]
    fn test_balance_purchases_minus_payments() {
        let purchases = vec![purchase(1, 5000, 30), purchase(2, 3000, 20)];
        let payments = vec![payment(1, 2000, 10)];
        assert_eq!(outstanding_balance(&purchases, &payments), 6000);
    }

    #[test]
    fn test_overpayment_floors_at_zero() {
        let purchases = vec![purchase(1, 10000, 30)];
        let payments = vec![payment(1, 15000, 10)];
        assert_eq!(outstanding_balance(&purchases, &payments), 0);
    }

    #[test]
    fn test_settled_purchases_do_not_count() {
        let mut settled = purchase(1, 5000, 30);
        settled.settled = true;
        let purchases = vec![settled, purchase(2, 3000, 20)];
        assert_eq!(outstanding_balance(&purchases, &[]), 3000);
    }

    #[test]
    fn test_merge_history_orders_most_recent_first() {
        // purchase(t1), payment(t2 > t1), purchase(t3 > t2)
        let purchases = vec![purchase(1, 5000, 30), purchase(2, 3000, 10)];
        let payments = vec![payment(1, 2000, 20)];

        let history = merge_history(&purchases, &payments);

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].kind, HistoryKind::Purchase);
        assert_eq!(history[0].amount_cents, 3000);
        assert_eq!(history[1].kind, HistoryKind::Payment);
        assert_eq!(history[1].amount_cents, 2000);
        assert_eq!(history[2].kind, HistoryKind::Purchase);
        assert_eq!(history[2].amount_cents, 5000);
    }

    #[test]
    fn test_merge_history_tie_break_is_deterministic() {
        let ts = Utc::now();
        let mut a = Purchase::new(1, "bread".into(), 500, ts);
        a.id = 1;
        let mut b = Payment::new(1, 500, ts);
        b.id = 7;

        let history = merge_history(&[a], &[b]);

        // Equal timestamps: purchases sort before payments.
        assert_eq!(history[0].kind, HistoryKind::Purchase);
        assert_eq!(history[1].kind, HistoryKind::Payment);
    }

    #[test]
    fn test_merge_history_carries_payment_note() {
        let payments = vec![{
            let mut p = payment(1, 2000, 5);
            p.note = Some("partial".into());
            p
        }];

        let history = merge_history(&[], &payments);
        assert_eq!(history[0].description.as_deref(), Some("partial"));
    }

    #[test]
    fn test_statistics_global_floor() {
        let stats = build_statistics(3, 10000, 4000);
        assert_eq!(stats.total_outstanding_cents, 6000);

        let overpaid = build_statistics(3, 10000, 12000);
        assert_eq!(overpaid.total_outstanding_cents, 0);
        assert_eq!(overpaid.total_purchases_cents, 10000);
        assert_eq!(overpaid.total_payments_cents, 12000);
    }

    #[test]
    fn test_statistics_floor_diverges_from_per_customer_floor() {
        // Customer A owes 5000; customer B overpaid by 3000. The global
        // formula nets them (2000), the per-customer sum does not (5000).
        let a_purchases = vec![purchase(1, 5000, 10)];
        let b_purchases = vec![purchase(2, 1000, 10)];
        let b_payments = vec![payment(1, 4000, 5)];

        let per_customer = outstanding_balance(&a_purchases, &[])
            + outstanding_balance(&b_purchases, &b_payments);
        let global = build_statistics(2, 6000, 4000);

        assert_eq!(per_customer, 5000);
        assert_eq!(global.total_outstanding_cents, 2000);
    }
}
