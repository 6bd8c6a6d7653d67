//! Tests for the catalog read paths and their signed preview URLs.

use axum::http::StatusCode;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn product_with_previews(conn: &rusqlite::Connection, title: &str, category: &str) -> Product {
    queries::create_product(
        conn,
        &CreateProduct {
            title: title.to_string(),
            description: String::new(),
            category: Some(category.to_string()),
            price: 1200,
            file_key: "products/secret-file-key.zip".to_string(),
            file_name: format!("{}.zip", title),
            file_size: 10,
            preview_keys: vec!["previews/one.png".to_string(), "previews/two.png".to_string()],
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_catalog_exposes_signed_previews_never_file_keys() {
    let env = create_test_env();
    product_with_previews(&env.conn(), "Poster", "print");

    let response = env.app().oneshot(get_request("/products", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let products = body.as_array().unwrap();
    assert_eq!(products.len(), 1);

    let urls = products[0]["previewImageUrls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    for url in urls {
        let url = url.as_str().unwrap();
        assert!(url.contains("mode=preview"));
        assert!(url.contains("signature="));
    }

    let raw = body.to_string();
    assert!(!raw.contains("secret-file-key"), "file keys must not leak");
    assert!(products[0].get("fileKey").is_none());
}

#[tokio::test]
async fn test_catalog_filters_by_category_and_hides_inactive() {
    let env = create_test_env();
    {
        let conn = env.conn();
        product_with_previews(&conn, "Poster", "print");
        product_with_previews(&conn, "Icons", "ui");
        let retired = product_with_previews(&conn, "Old Poster", "print");
        queries::set_product_active(&conn, &retired.id, false).unwrap();
    }

    let response = env
        .app()
        .oneshot(get_request("/products?category=print", None))
        .await
        .unwrap();

    let body = body_json(response).await;
    let titles: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Poster".to_string()]);
}

#[tokio::test]
async fn test_get_product_by_id() {
    let env = create_test_env();
    let product = product_with_previews(&env.conn(), "Poster", "print");

    let response = env
        .app()
        .oneshot(get_request(&format!("/products/{}", product.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], product.id);
    assert_eq!(body["price"], 1200);

    let response = env
        .app()
        .oneshot(get_request("/products/missing", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_previews_with_unconfigured_storage_return_503() {
    let env = create_test_env_with(EnvOptions {
        storage: false,
        ..Default::default()
    });
    product_with_previews(&env.conn(), "Poster", "print");

    let response = env.app().oneshot(get_request("/products", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health() {
    let env = create_test_env();
    let response = env.app().oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
