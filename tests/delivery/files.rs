//! Tests for GET /files/{*key}: capability URL dereference.

use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use tower::ServiceExt;

use design_market::storage::DeliveryMode;

#[path = "../common/mod.rs"]
mod common;
use common::*;

const CONTENTS: &[u8] = b"PK\x03\x04 fake zip";

async fn stored_object(env: &TestEnv) -> String {
    env.storage()
        .put_object("products", "Icon Pack.zip", CONTENTS)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_signed_attachment_url_serves_file() {
    let env = create_test_env();
    let key = stored_object(&env).await;
    let signed = env
        .storage()
        .sign(&key, DeliveryMode::Attachment, Some("Icon Pack.zip"));

    let response = env
        .app()
        .oneshot(get_request(path_and_query(&signed.url), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"Icon Pack.zip\""
    );
    assert_eq!(body_bytes(response).await, CONTENTS);
}

#[tokio::test]
async fn test_signed_preview_url_is_inline() {
    let env = create_test_env();
    let key = env
        .storage()
        .put_object("previews", "shot.png", b"png")
        .await
        .unwrap();
    let signed = env.storage().sign(&key, DeliveryMode::Preview, None);

    let response = env
        .app()
        .oneshot(get_request(path_and_query(&signed.url), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_DISPOSITION], "inline");
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_expired_url_is_forbidden() {
    let env = create_test_env();
    let key = stored_object(&env).await;
    // Issued two hours ago with a one hour lifetime
    let issued_at = chrono::Utc::now().timestamp() - 7200;
    let signed = test_url_signer().sign_at(&key, DeliveryMode::Attachment, None, issued_at);

    let response = env
        .app()
        .oneshot(get_request(path_and_query(&signed.url), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["details"], msg::LINK_EXPIRED);
}

#[tokio::test]
async fn test_tampered_url_is_forbidden() {
    let env = create_test_env();
    let key = stored_object(&env).await;
    let signed = env.storage().sign(&key, DeliveryMode::Attachment, None);

    let tampered = signed.url.replace(
        &format!("expires={}", signed.expires_at),
        &format!("expires={}", signed.expires_at + 86_400),
    );

    let response = env
        .app()
        .oneshot(get_request(path_and_query(&tampered), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["details"], msg::LINK_INVALID);
}

#[tokio::test]
async fn test_url_for_other_key_is_forbidden() {
    let env = create_test_env();
    let key = stored_object(&env).await;
    let other = stored_object(&env).await;
    let signed = env.storage().sign(&key, DeliveryMode::Attachment, None);

    let swapped = signed.url.replace(&key, &other);
    let response = env
        .app()
        .oneshot(get_request(path_and_query(&swapped), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_signed_url_for_missing_object_returns_404() {
    let env = create_test_env();
    let signed = env
        .storage()
        .sign("products/doesnotexist.zip", DeliveryMode::Attachment, None);

    let response = env
        .app()
        .oneshot(get_request(path_and_query(&signed.url), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_link_round_trip() {
    let env = create_test_env();
    let key = stored_object(&env).await;
    let (user, product) = {
        let conn = env.conn();
        let user = create_test_customer(&conn, "owner@market.test");
        let product = queries::create_product(
            &conn,
            &CreateProduct {
                title: "Icon Pack".to_string(),
                description: String::new(),
                category: None,
                price: 500,
                file_key: key.clone(),
                file_name: "Icon Pack.zip".to_string(),
                file_size: CONTENTS.len() as i64,
                preview_keys: vec![],
            },
        )
        .unwrap();
        queries::grant_entitlement(&conn, &user.id, &product.id).unwrap();
        (user, product)
    };
    let auth = bearer(&env.state, &user);

    let response = env
        .app()
        .oneshot(get_request(
            &format!("/products/{}/download", product.id),
            Some(&auth),
        ))
        .await
        .unwrap();
    let link = body_json(response).await;
    let url = link["downloadUrl"].as_str().unwrap().to_string();

    let response = env
        .app()
        .oneshot(get_request(path_and_query(&url), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, CONTENTS);
}
