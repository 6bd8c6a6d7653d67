//! The shared capture transition, including concurrent confirmations.

use std::sync::{Arc, Barrier};

use design_market::fulfillment::{CaptureOutcome, apply_capture};

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_apply_capture_outcomes() {
    let env = create_test_env();
    let mut conn = env.conn();
    let user = create_test_customer(&conn, "buyer@market.test");
    let product = create_test_product(&conn, "Icon Pack", 500);
    create_test_order(&conn, "order_1", &user, &product);

    let first = apply_capture(&mut conn, "order_1", "pay_1", Some("sig"), ConfirmationChannel::Client)
        .unwrap();
    assert!(matches!(first, CaptureOutcome::Paid(ref o) if o.status == OrderStatus::Paid));

    let second = apply_capture(&mut conn, "order_1", "pay_1", None, ConfirmationChannel::Webhook)
        .unwrap();
    assert!(matches!(second, CaptureOutcome::AlreadyPaid(_)));

    let missing = apply_capture(&mut conn, "nope", "pay_1", None, ConfirmationChannel::Webhook)
        .unwrap();
    assert!(matches!(missing, CaptureOutcome::OrderNotFound));

    create_test_order(&conn, "order_2", &user, &product);
    queries::try_mark_order_failed(&conn, "order_2").unwrap();
    let failed = apply_capture(&mut conn, "order_2", "pay_2", None, ConfirmationChannel::Webhook)
        .unwrap();
    assert!(matches!(failed, CaptureOutcome::RejectedTerminal(_)));

    assert_eq!(queries::list_entitlements(&conn, &user.id).unwrap().len(), 1);
}

#[test]
fn test_concurrent_captures_grant_exactly_once() {
    // Both channels racing on the same order: exactly one caller wins.
    let num_threads = 6;
    let env = create_test_env();
    let (user, product) = {
        let conn = env.conn();
        let user = create_test_customer(&conn, "buyer@market.test");
        let product = create_test_product(&conn, "Icon Pack", 500);
        create_test_order(&conn, "order_race", &user, &product);
        (user, product)
    };

    let barrier = Arc::new(Barrier::new(num_threads));
    let handles: Vec<_> = (0..num_threads)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let pool = env.state.db.clone();

            std::thread::spawn(move || {
                let mut conn = pool.get().expect("thread failed to get connection");
                let channel = if i % 2 == 0 {
                    ConfirmationChannel::Client
                } else {
                    ConfirmationChannel::Webhook
                };

                barrier.wait();

                matches!(
                    apply_capture(&mut conn, "order_race", "pay_race", None, channel)
                        .expect("capture should not error"),
                    CaptureOutcome::Paid(_)
                )
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();
    assert_eq!(winners, 1, "exactly one of {} captures should win", num_threads);

    let conn = env.conn();
    assert_eq!(
        queries::list_entitlements(&conn, &user.id).unwrap(),
        vec![product.id.clone()]
    );
    let events = queries::list_payment_events_for_order(&conn, "order_race").unwrap();
    assert_eq!(events.len(), num_threads);
    assert_eq!(
        events
            .iter()
            .filter(|e| e.outcome == ConfirmationOutcome::Paid)
            .count(),
        1
    );
}
