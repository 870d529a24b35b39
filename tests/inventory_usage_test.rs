mod common;

use std::collections::HashMap;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::TestApp;
use hotelier_api::{
    entities::inventory_usage::UsageStatus, errors::ServiceError,
    services::bookings::{CheckInRequest, CheckOutRequest},
};

#[tokio::test]
async fn assign_rejects_nonpositive_quantity() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    let item = app.seed_room_item(room_id, "towel", 2).await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();

    let err = app
        .inventory
        .assign(booking.id, item.id, 0)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .inventory
        .assign(booking.id, item.id, -3)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn transition_graph_is_enforced() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    let item = app.seed_room_item(room_id, "towel", 2).await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();
    let usage = app.inventory.assign(booking.id, item.id, 2).await.unwrap();
    assert_eq!(usage.status, UsageStatus::Assigned);

    let usage = app
        .inventory
        .transition(usage.id, UsageStatus::InUse)
        .await
        .unwrap();
    assert_eq!(usage.status, UsageStatus::InUse);

    // In use cannot go back to assigned.
    let err = app
        .inventory
        .transition(usage.id, UsageStatus::Assigned)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStateTransition { .. });

    let usage = app
        .inventory
        .transition(usage.id, UsageStatus::Damaged)
        .await
        .unwrap();
    assert_eq!(usage.status, UsageStatus::Damaged);

    // Terminal states have no exits.
    for target in [
        UsageStatus::Assigned,
        UsageStatus::InUse,
        UsageStatus::Returned,
        UsageStatus::Consumed,
    ] {
        let err = app
            .inventory
            .transition(usage.id, target)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidStateTransition { .. });
    }
}

#[tokio::test]
async fn entering_returned_stamps_the_instant_and_quantity() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    let item = app.seed_room_item(room_id, "soap", 5).await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();
    let usage = app.inventory.assign(booking.id, item.id, 5).await.unwrap();

    // Two bars used up before the rest comes back.
    app.inventory.consume(usage.id, 2).await.unwrap();
    let usage = app
        .inventory
        .transition(usage.id, UsageStatus::Returned)
        .await
        .unwrap();

    assert_eq!(usage.status, UsageStatus::Returned);
    assert!(usage.returned_at.is_some());
    assert_eq!(usage.quantity_consumed, 2);
    assert_eq!(usage.quantity_returned, 3);
}

#[tokio::test]
async fn counters_never_exceed_assigned_quantity() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    let item = app.seed_room_item(room_id, "towel", 5).await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();
    let usage = app.inventory.assign(booking.id, item.id, 5).await.unwrap();

    app.inventory.consume(usage.id, 2).await.unwrap();
    let updated = app.inventory.return_items(usage.id, 3).await.unwrap();
    assert_eq!(updated.quantity_consumed, 2);
    assert_eq!(updated.quantity_returned, 3);

    let err = app.inventory.consume(usage.id, 1).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    let err = app.inventory.return_items(usage.id, 1).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn counters_are_frozen_once_terminal() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    let item = app.seed_room_item(room_id, "towel", 4).await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();
    let usage = app.inventory.assign(booking.id, item.id, 4).await.unwrap();
    app.inventory
        .transition(usage.id, UsageStatus::Consumed)
        .await
        .unwrap();

    let err = app.inventory.consume(usage.id, 1).await.unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn check_out_dispositions_drive_the_dirty_batch() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    app.seed_room_item(room_id, "towel", 4).await;
    app.seed_room_item(room_id, "slippers", 1).await;

    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();
    app.pay_cash(booking.id, dec!(150000)).await;
    app.make_ready(booking.id).await;
    app.bookings
        .check_in(
            booking.id,
            CheckInRequest {
                operator_id: Uuid::new_v4(),
                registered_passengers: 2,
            },
        )
        .await
        .unwrap();

    let usages = app.inventory.usages_for_booking(booking.id).await.unwrap();
    let slippers = usages.iter().find(|u| u.quantity == 1).unwrap();

    // Guest kept the slippers; towels return by default.
    let mut dispositions = HashMap::new();
    dispositions.insert(slippers.id, UsageStatus::Consumed);
    app.bookings
        .check_out(
            booking.id,
            CheckOutRequest {
                operator_id: Uuid::new_v4(),
                override_date: None,
                discount: None,
                discount_reason: None,
                dispositions,
            },
        )
        .await
        .unwrap();

    let usages = app.inventory.usages_for_booking(booking.id).await.unwrap();
    let towels = usages.iter().find(|u| u.quantity == 4).unwrap();
    let slippers = usages.iter().find(|u| u.quantity == 1).unwrap();
    assert_eq!(towels.status, UsageStatus::Returned);
    assert_eq!(towels.quantity_returned, 4);
    assert_eq!(slippers.status, UsageStatus::Consumed);
    assert_eq!(slippers.quantity_returned, 0);
}

#[tokio::test]
async fn close_out_reports_returned_quantities_only() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    let towel = app.seed_room_item(room_id, "towel", 4).await;
    let soap = app.seed_room_item(room_id, "soap", 3).await;
    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();

    app.inventory.assign(booking.id, towel.id, 4).await.unwrap();
    let soap_usage = app.inventory.assign(booking.id, soap.id, 3).await.unwrap();
    app.inventory.consume(soap_usage.id, 3).await.unwrap();

    let dirty = app
        .inventory
        .close_out_for_booking(&*app.db, booking.id, &HashMap::new())
        .await
        .unwrap();

    // Soap is fully consumed, so only the towels head to the laundry.
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0].item_type, "towel");
    assert_eq!(dirty[0].quantity, 4);
}

#[tokio::test]
async fn check_out_rejects_nonterminal_disposition() {
    let app = TestApp::new().await;
    let room_id = Uuid::new_v4();
    app.seed_room_item(room_id, "towel", 2).await;

    let booking = app
        .bookings
        .create_booking(app.booking_request(room_id, dec!(150000)))
        .await
        .unwrap();
    app.pay_cash(booking.id, dec!(150000)).await;
    app.make_ready(booking.id).await;
    app.bookings
        .check_in(
            booking.id,
            CheckInRequest {
                operator_id: Uuid::new_v4(),
                registered_passengers: 2,
            },
        )
        .await
        .unwrap();

    let usages = app.inventory.usages_for_booking(booking.id).await.unwrap();
    let mut dispositions = HashMap::new();
    dispositions.insert(usages[0].id, UsageStatus::InUse);

    let err = app
        .bookings
        .check_out(
            booking.id,
            CheckOutRequest {
                operator_id: Uuid::new_v4(),
                override_date: None,
                discount: None,
                discount_reason: None,
                dispositions,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // The failed transaction left nothing terminal behind.
    let booking = app.bookings.get_booking(booking.id).await.unwrap();
    assert_eq!(
        booking.status,
        hotelier_api::entities::booking::BookingStatus::CheckedIn
    );
    let usages = app.inventory.usages_for_booking(booking.id).await.unwrap();
    assert!(usages.iter().all(|u| !u.status.is_terminal()));
}
