//! Tests for POST /payment/create-intent.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_create_intent_persists_created_order() {
    let env = create_test_env();
    let (user, product) = {
        let conn = env.conn();
        (
            create_test_customer(&conn, "buyer@market.test"),
            create_test_product(&conn, "Icon Pack", 500),
        )
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["amount"], 500);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["gatewayPublicKey"], TEST_KEY_ID);

    let intent_id = body["intentId"].as_str().unwrap();
    let order = queries::get_order_by_id(&env.conn(), intent_id)
        .unwrap()
        .expect("order should be persisted before responding");
    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(order.user_id, user.id);
    assert_eq!(order.product_id, product.id);
    assert_eq!(order.amount, 500);

    let requests = env.orders.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, 500, "gateway receives the minor-unit amount");
    assert_eq!(requests[0].currency, "INR");
}

#[tokio::test]
async fn test_create_intent_unknown_product_returns_404() {
    let env = create_test_env();
    let user = create_test_customer(&env.conn(), "buyer@market.test");
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": "missing" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(env.orders.calls(), 0, "gateway must not be called");
}

#[tokio::test]
async fn test_create_intent_inactive_product_returns_404() {
    let env = create_test_env();
    let (user, product) = {
        let conn = env.conn();
        let product = create_test_product(&conn, "Retired", 900);
        queries::set_product_active(&conn, &product.id, false).unwrap();
        (create_test_customer(&conn, "buyer@market.test"), product)
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_intent_already_purchased_returns_400_without_order() {
    let env = create_test_env();
    let (user, product) = {
        let conn = env.conn();
        let user = create_test_customer(&conn, "owner@market.test");
        let product = create_test_product(&conn, "Owned", 700);
        queries::grant_entitlement(&conn, &user.id, &product.id).unwrap();
        (user, product)
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["details"], msg::ALREADY_PURCHASED);

    assert_eq!(env.orders.calls(), 0);
    let orders = queries::list_orders_for_user_product(&env.conn(), &user.id, &product.id).unwrap();
    assert!(orders.is_empty(), "no order should be created");
}

#[tokio::test]
async fn test_create_intent_gateway_failure_persists_nothing() {
    let env = create_test_env();
    env.orders.fail();
    let (user, product) = {
        let conn = env.conn();
        (
            create_test_customer(&conn, "buyer@market.test"),
            create_test_product(&conn, "Icon Pack", 500),
        )
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let orders = queries::list_orders_for_user_product(&env.conn(), &user.id, &product.id).unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_create_intent_rejects_gateway_amount_mismatch() {
    let env = create_test_env();
    env.orders.skew_amount(1);
    let (user, product) = {
        let conn = env.conn();
        (
            create_test_customer(&conn, "buyer@market.test"),
            create_test_product(&conn, "Icon Pack", 500),
        )
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["details"], msg::GATEWAY_AMOUNT_MISMATCH);
    let orders = queries::list_orders_for_user_product(&env.conn(), &user.id, &product.id).unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_create_intent_unconfigured_gateway_returns_503() {
    let env = create_test_env_with(EnvOptions {
        gateway: false,
        ..Default::default()
    });
    let (user, product) = {
        let conn = env.conn();
        (
            create_test_customer(&conn, "buyer@market.test"),
            create_test_product(&conn, "Icon Pack", 500),
        )
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "upstream_unavailable");
}

#[tokio::test]
async fn test_create_intent_requires_authentication() {
    let env = create_test_env();
    let product = create_test_product(&env.conn(), "Icon Pack", 500);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            None,
            &json!({ "productId": product.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(env.orders.calls(), 0);
}

#[tokio::test]
async fn test_create_intent_empty_product_id_returns_400() {
    let env = create_test_env();
    let user = create_test_customer(&env.conn(), "buyer@market.test");
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(json_request(
            "POST",
            "/payment/create-intent",
            Some(&auth),
            &json!({ "productId": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeated_intents_before_payment_each_create_an_order() {
    let env = create_test_env();
    let (user, product) = {
        let conn = env.conn();
        (
            create_test_customer(&conn, "buyer@market.test"),
            create_test_product(&conn, "Icon Pack", 500),
        )
    };
    let auth = bearer(&env.state, &user);

    for _ in 0..2 {
        let response = env
            .app()
            .oneshot(json_request(
                "POST",
                "/payment/create-intent",
                Some(&auth),
                &json!({ "productId": product.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let orders = queries::list_orders_for_user_product(&env.conn(), &user.id, &product.id).unwrap();
    assert_eq!(orders.len(), 2, "unpaid intents do not block new ones");
    assert!(orders.iter().all(|o| o.status == OrderStatus::Created));
}
