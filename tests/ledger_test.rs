mod common;

use anyhow::Result;
use chrono::Utc;
use common::{parse_date, test_service};
use fiado::application::AppError;
use fiado::domain::HistoryKind;

#[tokio::test]
async fn test_balance_is_purchases_minus_payments() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    service
        .add_purchase(customer.id, "rice".to_string(), 5000, Utc::now())
        .await?;
    service
        .add_purchase(customer.id, "beans".to_string(), 3000, Utc::now())
        .await?;
    service
        .add_payment(customer.id, 2000, None, Utc::now())
        .await?;

    assert_eq!(service.compute_balance(customer.id).await?, 6000);

    Ok(())
}

#[tokio::test]
async fn test_overpayment_clamps_balance_to_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    service
        .add_purchase(customer.id, "groceries".to_string(), 10000, Utc::now())
        .await?;
    service
        .add_payment(customer.id, 15000, None, Utc::now())
        .await?;

    assert_eq!(service.compute_balance(customer.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_debtor_list_contains_customer_iff_balance_positive() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ana = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;
    let bruno = service
        .register_customer("Bruno Costa".to_string(), None, None)
        .await?;
    let carlos = service
        .register_customer("Carlos Pereira".to_string(), None, None)
        .await?;

    // Ana owes, Bruno overpaid, Carlos has no records.
    service
        .add_purchase(ana.id, "rice".to_string(), 5000, Utc::now())
        .await?;
    service
        .add_purchase(bruno.id, "coffee".to_string(), 10000, Utc::now())
        .await?;
    service
        .add_payment(bruno.id, 15000, None, Utc::now())
        .await?;
    let _ = carlos;

    let debtors = service.list_customers_with_debt().await?;

    assert_eq!(debtors.len(), 1);
    assert_eq!(debtors[0].customer.name, "Ana Silva");
    assert_eq!(debtors[0].balance_cents, 5000);

    Ok(())
}

#[tokio::test]
async fn test_debtor_list_follows_search_order() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let carlos = service
        .register_customer("Carlos Pereira".to_string(), None, None)
        .await?;
    let ana = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    service
        .add_purchase(carlos.id, "flour".to_string(), 2000, Utc::now())
        .await?;
    service
        .add_purchase(ana.id, "sugar".to_string(), 1000, Utc::now())
        .await?;

    let debtors = service.list_customers_with_debt().await?;
    let names: Vec<&str> = debtors.iter().map(|d| d.customer.name.as_str()).collect();
    assert_eq!(names, vec!["Ana Silva", "Carlos Pereira"]);

    Ok(())
}

#[tokio::test]
async fn test_history_merges_both_streams_most_recent_first() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    // purchase($50, t1), payment($20, t2 > t1), purchase($30, t3 > t2)
    service
        .add_purchase(
            customer.id,
            "groceries".to_string(),
            5000,
            parse_date("2024-03-01"),
        )
        .await?;
    service
        .add_payment(customer.id, 2000, None, parse_date("2024-03-05"))
        .await?;
    service
        .add_purchase(
            customer.id,
            "cleaning".to_string(),
            3000,
            parse_date("2024-03-10"),
        )
        .await?;

    let history = service.get_history(customer.id).await?;

    assert_eq!(history.len(), 3);
    assert_eq!(history[0].kind, HistoryKind::Purchase);
    assert_eq!(history[0].amount_cents, 3000);
    assert_eq!(history[1].kind, HistoryKind::Payment);
    assert_eq!(history[1].amount_cents, 2000);
    assert_eq!(history[2].kind, HistoryKind::Purchase);
    assert_eq!(history[2].amount_cents, 5000);

    Ok(())
}

#[tokio::test]
async fn test_history_tie_break_puts_purchases_first() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    let ts = parse_date("2024-03-01");
    service
        .add_payment(customer.id, 2000, None, ts)
        .await?;
    service
        .add_purchase(customer.id, "bread".to_string(), 500, ts)
        .await?;

    let history = service.get_history(customer.id).await?;

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, HistoryKind::Purchase);
    assert_eq!(history[1].kind, HistoryKind::Payment);

    Ok(())
}

#[tokio::test]
async fn test_history_carries_payment_notes_and_purchase_descriptions() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    service
        .add_purchase(
            customer.id,
            "2kg rice".to_string(),
            1500,
            parse_date("2024-03-01"),
        )
        .await?;
    service
        .add_payment(
            customer.id,
            1000,
            Some("partial, cash".to_string()),
            parse_date("2024-03-02"),
        )
        .await?;
    service
        .add_payment(customer.id, 500, None, parse_date("2024-03-03"))
        .await?;

    let history = service.get_history(customer.id).await?;

    assert_eq!(history[0].description, None);
    assert_eq!(history[1].description.as_deref(), Some("partial, cash"));
    assert_eq!(history[2].description.as_deref(), Some("2kg rice"));

    Ok(())
}

#[tokio::test]
async fn test_purchase_rejects_non_positive_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    let zero = service
        .add_purchase(customer.id, "nothing".to_string(), 0, Utc::now())
        .await;
    assert!(matches!(zero, Err(AppError::InvalidAmount(0))));

    let negative = service
        .add_purchase(customer.id, "refund?".to_string(), -500, Utc::now())
        .await;
    assert!(matches!(negative, Err(AppError::InvalidAmount(-500))));

    Ok(())
}

#[tokio::test]
async fn test_purchase_rejects_blank_description() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    let result = service
        .add_purchase(customer.id, "  ".to_string(), 1000, Utc::now())
        .await;
    assert!(matches!(result, Err(AppError::EmptyDescription)));

    Ok(())
}

#[tokio::test]
async fn test_records_require_an_existing_customer() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let purchase = service
        .add_purchase(42, "rice".to_string(), 1000, Utc::now())
        .await;
    assert!(matches!(purchase, Err(AppError::CustomerNotFound(42))));

    let payment = service.add_payment(42, 1000, None, Utc::now()).await;
    assert!(matches!(payment, Err(AppError::CustomerNotFound(42))));

    let balance = service.compute_balance(42).await;
    assert!(matches!(balance, Err(AppError::CustomerNotFound(42))));

    Ok(())
}

#[tokio::test]
async fn test_payment_rejects_non_positive_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;

    let result = service.add_payment(customer.id, 0, None, Utc::now()).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(0))));

    Ok(())
}

#[tokio::test]
async fn test_deactivation_keeps_records_and_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let customer = service
        .register_customer("Ana Silva".to_string(), None, None)
        .await?;
    service
        .add_purchase(customer.id, "rice".to_string(), 5000, Utc::now())
        .await?;

    service.deactivate_customer(customer.id).await?;

    // The record streams and derived balance survive deactivation.
    assert_eq!(service.compute_balance(customer.id).await?, 5000);
    assert_eq!(service.get_history(customer.id).await?.len(), 1);

    // But a deactivated customer is not a listed debtor.
    let debtors = service.list_customers_with_debt().await?;
    assert!(debtors.is_empty());

    Ok(())
}
