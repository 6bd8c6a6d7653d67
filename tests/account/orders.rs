//! Tests for the order history endpoints.

use axum::http::StatusCode;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

struct History {
    env: TestEnv,
    buyer: User,
    other: User,
    admin: User,
}

fn history() -> History {
    let env = create_test_env();
    let (buyer, other, admin) = {
        let conn = env.conn();
        let buyer = create_test_customer(&conn, "buyer@market.test");
        let other = create_test_customer(&conn, "other@market.test");
        let admin = create_test_admin(&conn);
        let product = create_test_product(&conn, "Icon Pack", 500);

        create_test_order(&conn, "order_paid", &buyer, &product);
        create_test_order(&conn, "order_open", &buyer, &product);
        create_test_order(&conn, "order_other", &other, &product);
        queries::try_mark_order_paid(&conn, "order_paid", "pay_1", Some("sig_1")).unwrap();
        (buyer, other, admin)
    };
    History {
        env,
        buyer,
        other,
        admin,
    }
}

#[tokio::test]
async fn test_my_orders_lists_paid_purchases() {
    let h = history();
    let auth = bearer(&h.env.state, &h.buyer);

    let response = h
        .env
        .app()
        .oneshot(get_request("/orders/mine", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], "order_paid");
    assert_eq!(orders[0]["productTitle"], "Icon Pack");
    assert_eq!(orders[0]["status"], "paid");
}

#[tokio::test]
async fn test_admin_lists_all_orders() {
    let h = history();
    let auth = bearer(&h.env.state, &h.admin);

    let response = h.env.app().oneshot(get_request("/orders", Some(&auth))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 3);

    let paid = orders.iter().find(|o| o["id"] == "order_paid").unwrap();
    assert_eq!(paid["buyerEmail"], "buyer@market.test");
    assert_eq!(paid["buyerName"], h.buyer.name);
    assert_eq!(paid["productTitle"], "Icon Pack");
}

#[tokio::test]
async fn test_admin_stats_count_only_paid_orders() {
    let h = history();
    queries::try_mark_order_failed(&h.env.conn(), "order_other").unwrap();
    let auth = bearer(&h.env.state, &h.admin);

    let response = h
        .env
        .app()
        .oneshot(get_request("/admin/stats", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["totalOrders"], 1);
    assert_eq!(body["revenueByCurrency"][0]["currency"], "INR");
    assert_eq!(body["revenueByCurrency"][0]["revenue"], 500);
    assert_eq!(body["revenueByCurrency"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalCustomers"], 2);
    assert_eq!(body["totalProducts"], 1);
}

#[tokio::test]
async fn test_admin_stats_forbidden_for_customers() {
    let h = history();
    let auth = bearer(&h.env.state, &h.buyer);

    let response = h
        .env
        .app()
        .oneshot(get_request("/admin/stats", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_can_view_order() {
    let h = history();
    let auth = bearer(&h.env.state, &h.buyer);

    let response = h
        .env
        .app()
        .oneshot(get_request("/orders/order_paid", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["paymentId"], "pay_1");
    assert_eq!(body["userId"], h.buyer.id);
}

#[tokio::test]
async fn test_other_customer_cannot_view_order() {
    let h = history();
    let auth = bearer(&h.env.state, &h.other);

    let response = h
        .env
        .app()
        .oneshot(get_request("/orders/order_paid", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_can_view_any_order() {
    let h = history();
    let auth = bearer(&h.env.state, &h.admin);

    let response = h
        .env
        .app()
        .oneshot(get_request("/orders/order_other", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_order_returns_404() {
    let h = history();
    let auth = bearer(&h.env.state, &h.buyer);

    let response = h
        .env
        .app()
        .oneshot(get_request("/orders/order_missing", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
