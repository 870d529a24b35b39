mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait};
use uuid::Uuid;

use common::TestApp;
use hotelier_api::{
    entities::payment::{PaymentMethod, PaymentStatus},
    entities::shift::{self, ShiftStatus},
    errors::ServiceError,
    services::bookings::{CheckInRequest, CheckOutRequest},
    services::shifts::{CloseShiftRequest, OpenShiftRequest, OPEN_SHIFT_EXISTS},
};

#[tokio::test]
async fn open_shift_rejects_negative_cash() {
    let app = TestApp::new().await;

    let err = app
        .shifts
        .open(OpenShiftRequest {
            operator_id: Uuid::new_v4(),
            opening_cash: dec!(-1),
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn second_open_shift_conflicts_and_leaves_original_untouched() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();

    let first = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(50000),
            notes: Some("morning".to_string()),
        })
        .await
        .unwrap();

    let err = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(10000),
            notes: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(msg) if msg == OPEN_SHIFT_EXISTS);

    let unchanged = app.shifts.get_shift(first.id).await.unwrap();
    assert_eq!(unchanged.status, ShiftStatus::Open);
    assert_eq!(unchanged.opening_cash, dec!(50000));
    assert_eq!(unchanged.total_transactions, 0);

    // A different operator is unaffected.
    app.shifts
        .open(OpenShiftRequest {
            operator_id: Uuid::new_v4(),
            opening_cash: dec!(0),
            notes: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn payments_feed_method_totals_and_counters() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();
    let shift = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(50000),
            notes: None,
        })
        .await
        .unwrap();

    let booking = app
        .bookings
        .create_booking(app.booking_request(Uuid::new_v4(), dec!(500000)))
        .await
        .unwrap();

    for _ in 0..3 {
        app.pay(
            booking.id,
            dec!(30000),
            PaymentMethod::Cash,
            PaymentStatus::Completed,
            operator_id,
        )
        .await;
    }
    app.pay(
        booking.id,
        dec!(80000),
        PaymentMethod::Card,
        PaymentStatus::Completed,
        operator_id,
    )
    .await;
    app.pay(
        booking.id,
        dec!(20000),
        PaymentMethod::Transfer,
        PaymentStatus::Authorized,
        operator_id,
    )
    .await;

    let shift = app.shifts.get_shift(shift.id).await.unwrap();
    assert_eq!(shift.total_cash_sales, dec!(90000));
    assert_eq!(shift.cash_count, 3);
    assert_eq!(shift.total_card_sales, dec!(80000));
    assert_eq!(shift.card_count, 1);
    assert_eq!(shift.total_transfer_sales, dec!(20000));
    assert_eq!(shift.transfer_count, 1);
    assert_eq!(shift.total_sales, dec!(190000));
    assert_eq!(shift.total_transactions, 5);
}

#[tokio::test]
async fn uncounted_payments_are_not_attributed() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();
    let shift = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(0),
            notes: None,
        })
        .await
        .unwrap();

    let booking = app
        .bookings
        .create_booking(app.booking_request(Uuid::new_v4(), dec!(150000)))
        .await
        .unwrap();
    app.pay(
        booking.id,
        dec!(150000),
        PaymentMethod::Card,
        PaymentStatus::Failed,
        operator_id,
    )
    .await;
    app.pay(
        booking.id,
        dec!(150000),
        PaymentMethod::Card,
        PaymentStatus::Pending,
        operator_id,
    )
    .await;

    let shift = app.shifts.get_shift(shift.id).await.unwrap();
    assert_eq!(shift.total_sales, Decimal::ZERO);
    assert_eq!(shift.total_transactions, 0);
}

#[tokio::test]
async fn payments_without_an_open_shift_still_land() {
    let app = TestApp::new().await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(Uuid::new_v4(), dec!(150000)))
        .await
        .unwrap();

    // Operator never opened a drawer; the payment records unattributed.
    let outcome = app.pay_cash(booking.id, dec!(150000)).await;
    assert!(outcome.financials.unwrap().is_fully_paid);
}

#[tokio::test]
async fn close_computes_expected_cash_and_difference() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();
    let shift = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(50000),
            notes: None,
        })
        .await
        .unwrap();

    let booking = app
        .bookings
        .create_booking(app.booking_request(Uuid::new_v4(), dec!(500000)))
        .await
        .unwrap();
    for _ in 0..3 {
        app.pay(
            booking.id,
            dec!(30000),
            PaymentMethod::Cash,
            PaymentStatus::Completed,
            operator_id,
        )
        .await;
    }

    let closed = app
        .shifts
        .close(
            shift.id,
            CloseShiftRequest {
                closing_cash: dec!(140000),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(closed.status, ShiftStatus::Closed);
    assert_eq!(closed.expected_cash, Some(dec!(140000)));
    assert_eq!(closed.cash_difference, Some(dec!(0)));
    assert!(closed.closed_at.is_some());
}

#[tokio::test]
async fn close_reports_a_short_drawer() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();
    let shift = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(50000),
            notes: None,
        })
        .await
        .unwrap();

    let closed = app
        .shifts
        .close(
            shift.id,
            CloseShiftRequest {
                closing_cash: dec!(49000),
                notes: Some("short".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(closed.expected_cash, Some(dec!(50000)));
    assert_eq!(closed.cash_difference, Some(dec!(-1000)));
}

#[tokio::test]
async fn closing_twice_is_rejected() {
    let app = TestApp::new().await;
    let shift = app
        .shifts
        .open(OpenShiftRequest {
            operator_id: Uuid::new_v4(),
            opening_cash: dec!(0),
            notes: None,
        })
        .await
        .unwrap();
    app.shifts
        .close(
            shift.id,
            CloseShiftRequest {
                closing_cash: dec!(0),
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .shifts
        .close(
            shift.id,
            CloseShiftRequest {
                closing_cash: dec!(0),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidStateTransition { ref from, ref attempted }
            if from == "closed" && attempted == "close"
    );
}

#[tokio::test]
async fn booking_activity_bumps_shift_counters() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();
    let shift = app
        .shifts
        .open(OpenShiftRequest {
            operator_id,
            opening_cash: dec!(0),
            notes: None,
        })
        .await
        .unwrap();

    let mut request = app.booking_request(Uuid::new_v4(), dec!(150000));
    request.created_by = operator_id;
    let booking = app.bookings.create_booking(request).await.unwrap();

    app.pay(
        booking.id,
        dec!(150000),
        PaymentMethod::Cash,
        PaymentStatus::Completed,
        operator_id,
    )
    .await;
    app.make_ready(booking.id).await;
    app.bookings
        .check_in(
            booking.id,
            CheckInRequest {
                operator_id,
                registered_passengers: 2,
            },
        )
        .await
        .unwrap();
    app.bookings
        .check_out(
            booking.id,
            CheckOutRequest {
                operator_id,
                override_date: None,
                discount: None,
                discount_reason: None,
                dispositions: Default::default(),
            },
        )
        .await
        .unwrap();

    let shift = app.shifts.get_shift(shift.id).await.unwrap();
    assert_eq!(shift.bookings_created, 1);
    assert_eq!(shift.check_in_count, 1);
    assert_eq!(shift.check_out_count, 1);
}

#[tokio::test]
async fn reconcile_duplicates_keeps_only_the_newest_open_shift() {
    let app = TestApp::new().await;
    let operator_id = Uuid::new_v4();

    // Two open rows for one operator, as legacy data written before the
    // unique index could hold. The index must go first; the service and the
    // schema both refuse to create this state today.
    app.db
        .execute_unprepared("DROP INDEX idx_shifts_one_open_per_operator")
        .await
        .unwrap();
    let older = seed_open_shift(&app, operator_id, dec!(10000), Duration::hours(8)).await;
    let newer = seed_open_shift(&app, operator_id, dec!(20000), Duration::hours(1)).await;

    let closed = app.shifts.reconcile_duplicates(operator_id).await.unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, older.id);
    assert_eq!(closed[0].status, ShiftStatus::Closed);
    assert_eq!(closed[0].cash_difference, Some(dec!(0)));
    assert!(closed[0]
        .closing_notes
        .as_deref()
        .unwrap_or_default()
        .contains("Force-closed"));

    let kept = app.shifts.get_shift(newer.id).await.unwrap();
    assert_eq!(kept.status, ShiftStatus::Open);
}

async fn seed_open_shift(
    app: &TestApp,
    operator_id: Uuid,
    opening_cash: Decimal,
    opened_ago: Duration,
) -> shift::Model {
    let now = Utc::now();
    shift::ActiveModel {
        id: Set(Uuid::new_v4()),
        operator_id: Set(operator_id),
        status: Set(ShiftStatus::Open),
        opened_at: Set(now - opened_ago),
        closed_at: Set(None),
        opening_cash: Set(opening_cash),
        closing_cash: Set(None),
        expected_cash: Set(None),
        cash_difference: Set(None),
        total_cash_sales: Set(Decimal::ZERO),
        total_card_sales: Set(Decimal::ZERO),
        total_transfer_sales: Set(Decimal::ZERO),
        total_sales: Set(Decimal::ZERO),
        cash_count: Set(0),
        card_count: Set(0),
        transfer_count: Set(0),
        total_transactions: Set(0),
        check_in_count: Set(0),
        check_out_count: Set(0),
        bookings_created: Set(0),
        opening_notes: Set(None),
        closing_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed shift")
}
