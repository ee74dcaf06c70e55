//! Order lifecycle against a real database.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`mp-cli migrate all`)
//! - `DATABASE_URL` pointing at it
//!
//! Run with: cargo test -p moonlit-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;
use uuid::Uuid;

use moonlit_admin::db::{AdminOrderRepository, DeliveryUpdate, RepositoryError};
use moonlit_core::{DeliveryStatus, PaymentMethod, PaymentStatus, TransitionError};
use moonlit_integration_tests::{place_order, test_pool, unique_discord_id};

fn delivery(status: DeliveryStatus) -> DeliveryUpdate {
    DeliveryUpdate {
        status,
        tracking_id: None,
        courier: None,
        note: None,
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_checkout_snapshots_cart_and_totals() {
    let pool = test_pool().await;
    let placed = place_order(&pool, PaymentMethod::Cod, true, None).await;

    assert_eq!(placed.items.len(), 1);
    let item = placed.items.first().unwrap();
    assert_eq!(item.quantity, 2);
    assert_eq!(placed.order.total_amount, Decimal::new(59998, 2));
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
    assert_eq!(placed.order.delivery_status, DeliveryStatus::Pending);
    assert!(placed.order.order_number.starts_with("MP-"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_cod_order_completes_payment_on_delivery() {
    let pool = test_pool().await;
    let repo = AdminOrderRepository::new(&pool);
    let actor = unique_discord_id();
    let mut order = place_order(&pool, PaymentMethod::Cod, true, None).await.order;

    for status in [
        DeliveryStatus::Shipped,
        DeliveryStatus::OutForDelivery,
        DeliveryStatus::Delivered,
    ] {
        let outcome = order.state().apply_delivery(status).unwrap();
        order = repo
            .apply_delivery(&order, &outcome, &delivery(status), &actor)
            .await
            .unwrap();
    }

    assert_eq!(order.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(order.payment_status, PaymentStatus::Completed);

    let payment = repo.payment(order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);

    let logs = repo.logs(order.id).await.unwrap();
    assert_eq!(logs.len(), 4);
    let (placed, moves) = logs.split_first().unwrap();
    assert_eq!(placed.status, DeliveryStatus::Pending);
    assert_eq!(placed.changed_by, "system");
    assert_eq!(
        moves.iter().map(|log| log.status).collect::<Vec<_>>(),
        [
            DeliveryStatus::Shipped,
            DeliveryStatus::OutForDelivery,
            DeliveryStatus::Delivered,
        ]
    );
    assert!(moves.iter().all(|log| log.changed_by == actor.as_str()));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_unverified_cod_order_cannot_ship() {
    let pool = test_pool().await;
    let order = place_order(&pool, PaymentMethod::Cod, false, None).await.order;

    assert_eq!(
        order.state().apply_delivery(DeliveryStatus::Shipped),
        Err(TransitionError::PhoneNotVerified)
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_manual_order_ships_only_after_verification() {
    let pool = test_pool().await;
    let repo = AdminOrderRepository::new(&pool);
    let actor = unique_discord_id();
    let utr = format!("UTR{}", Uuid::new_v4().simple());
    let order = place_order(&pool, PaymentMethod::Manual, false, Some(&utr))
        .await
        .order;

    assert_eq!(
        order.state().apply_delivery(DeliveryStatus::Shipped),
        Err(TransitionError::PaymentNotCompleted)
    );

    order.state().check_payment(PaymentStatus::Completed).unwrap();
    let verified = repo
        .set_payment(&order, PaymentStatus::Completed, &actor, None, None)
        .await
        .unwrap();
    assert_eq!(verified.payment_status, PaymentStatus::Completed);

    let payment = repo.payment(verified.id).await.unwrap().unwrap();
    assert_eq!(payment.verified_by.as_deref(), Some(actor.as_str()));
    assert_eq!(payment.transaction_ref.as_deref(), Some(utr.as_str()));

    assert!(verified.state().apply_delivery(DeliveryStatus::Shipped).is_ok());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_rejected_payment_records_reviewer_and_reason() {
    let pool = test_pool().await;
    let repo = AdminOrderRepository::new(&pool);
    let actor = unique_discord_id();
    let order = place_order(&pool, PaymentMethod::Manual, false, None).await.order;

    order.state().check_payment(PaymentStatus::Failed).unwrap();
    let rejected = repo
        .set_payment(&order, PaymentStatus::Failed, &actor, None, Some("blurry screenshot"))
        .await
        .unwrap();
    assert_eq!(rejected.payment_status, PaymentStatus::Failed);
    assert!(!rejected.state().is_open());

    let payment = repo.payment(order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert_eq!(payment.verified_by.as_deref(), Some(actor.as_str()));
    assert!(payment.verified_at.is_some());
    assert_eq!(payment.failure_reason.as_deref(), Some("blurry screenshot"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_stale_order_write_is_a_conflict() {
    let pool = test_pool().await;
    let repo = AdminOrderRepository::new(&pool);
    let actor = unique_discord_id();
    let stale = place_order(&pool, PaymentMethod::Manual, false, None).await.order;

    repo.set_payment(&stale, PaymentStatus::Failed, &actor, None, Some("no transfer"))
        .await
        .unwrap();

    let second = repo
        .set_payment(&stale, PaymentStatus::Completed, &actor, None, None)
        .await;
    assert!(matches!(second, Err(RepositoryError::Conflict(_))));

    let current = repo.get(stale.id).await.unwrap().unwrap();
    assert_eq!(current.payment_status, PaymentStatus::Failed);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_transaction_reference_is_unique() {
    let pool = test_pool().await;
    let repo = AdminOrderRepository::new(&pool);
    let actor = unique_discord_id();
    let utr = format!("UTR{}", Uuid::new_v4().simple());

    let first = place_order(&pool, PaymentMethod::Manual, false, Some(&utr))
        .await
        .order;
    let second = place_order(&pool, PaymentMethod::Manual, false, None).await.order;

    repo.set_payment(&first, PaymentStatus::Completed, &actor, None, None)
        .await
        .unwrap();
    let duplicate = repo
        .set_payment(&second, PaymentStatus::Completed, &actor, Some(&utr), None)
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let unchanged = repo.get(second.id).await.unwrap().unwrap();
    assert_eq!(unchanged.payment_status, PaymentStatus::Pending);
}
