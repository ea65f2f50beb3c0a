//! Repository tests against a live PostgreSQL instance.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -p dispatch-db -- --ignored`.

use dispatch_db::models::order::{OrderDraft, OrderField};
use dispatch_db::models::payment::{Payment, PaymentStatus};
use dispatch_db::repositories::{OrderRepository, PaymentRepository, UserRepository};
use dispatch_db::{OrderStore, PaymentStore, StoreError, UserStore};
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn user_upsert_is_stable(pool: PgPool) {
    let users = UserRepository::new(pool);
    let first = users.user_get(77).await.unwrap();
    let again = users.user_get(77).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(users.user_get_by_id(first.id).await.unwrap(), first);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn order_fields_fill_in_order(pool: PgPool) {
    let users = UserRepository::new(pool.clone());
    let orders = OrderRepository::new(pool);
    let user = users.user_get(1).await.unwrap();
    let order = orders.order_create(user.id, 1).await.unwrap();

    let err = orders
        .order_set_field(order.id, OrderField::Time, "14:00")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::OutOfOrder { .. }));

    orders.order_set_field(order.id, OrderField::Source, "123 Main St").await.unwrap();
    orders.order_set_field(order.id, OrderField::Time, "14:00").await.unwrap();
    orders.order_set_field(order.id, OrderField::Destination, "456 Oak Ave").await.unwrap();
    let done = orders
        .order_set_field(order.id, OrderField::Phone, "+15551234567")
        .await
        .unwrap();
    assert!(done.is_complete());

    let missing = orders
        .order_set_field(i64::MAX, OrderField::Source, "x")
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn latest_order_wins(pool: PgPool) {
    let users = UserRepository::new(pool.clone());
    let orders = OrderRepository::new(pool);
    let user = users.user_get(2).await.unwrap();
    let first = orders.order_create(user.id, 2).await.unwrap();
    let second = orders.order_create(user.id, 2).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(orders.order_get(user.id).await.unwrap().id, second.id);

    let intake = orders
        .order_create_from_intake(&OrderDraft {
            source: "Airport".into(),
            destination: "Center".into(),
            time: "09:30".into(),
            phone: "+70000000000".into(),
        })
        .await
        .unwrap();
    assert!(intake.is_complete());
    assert_eq!(intake.user_id, None);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn payment_status_lifecycle(pool: PgPool) {
    let users = UserRepository::new(pool.clone());
    let orders = OrderRepository::new(pool.clone());
    let payments = PaymentRepository::new(pool);
    let user = users.user_get(3).await.unwrap();
    let order = orders.order_create(user.id, 3).await.unwrap();

    let payment = Payment {
        id: Uuid::new_v4(),
        order_id: order.id,
        status: PaymentStatus::Pending,
        confirmation_url: "https://pay.example/c".into(),
    };
    payments.payment_create(&payment).await.unwrap();
    assert_eq!(payments.payments_for_check().await.unwrap(), vec![payment.clone()]);

    let err = payments
        .payment_set_status(Uuid::new_v4(), PaymentStatus::Succeeded)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(payments.payment_get(payment.id).await.unwrap().status, PaymentStatus::Pending);

    payments
        .payment_set_status(payment.id, PaymentStatus::Canceled)
        .await
        .unwrap();
    assert!(payments.payments_for_check().await.unwrap().is_empty());
}
