// ABOUTME: HTTP tests for the per-user provider credential store
// ABOUTME: Guard enforcement, prefixing, and cookie/bearer token acceptance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_api_keys_require_authentication() {
    let (app, _resources, _cache) = common::create_test_app().await.unwrap();

    let response = common::get_with_auth(&app, "/user/api-keys", None).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = common::get_with_auth(&app, "/user/api-keys", Some("garbage-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_set_and_get_api_keys_with_bearer_token() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    let user = common::create_test_user(&resources, "keys@example.com", "long-enough-pw")
        .await
        .unwrap();
    let token = resources.codec.mint_login(&user).unwrap();

    // Provider name is lower-cased and embedded as the stored prefix
    let response = common::post_json_with_auth(
        &app,
        "/user/api-keys",
        json!({ "keyType": "OpenAI", "apiKey": "sk-123" }),
        &token,
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::OK).await.unwrap();

    let response = common::get_with_auth(&app, "/user/api-keys", Some(&token))
        .await
        .unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["api_keys"]["openai"], "openai_sk-123");

    // Second provider coexists; overwrite replaces in place
    let response = common::post_json_with_auth(
        &app,
        "/user/api-keys",
        json!({ "keyType": "anthropic", "apiKey": "ak-9" }),
        &token,
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::OK).await.unwrap();

    let response = common::post_json_with_auth(
        &app,
        "/user/api-keys",
        json!({ "keyType": "openai", "apiKey": "sk-456" }),
        &token,
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::OK).await.unwrap();

    let response = common::get_with_auth(&app, "/user/api-keys", Some(&token))
        .await
        .unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["api_keys"]["openai"], "openai_sk-456");
    assert_eq!(body["api_keys"]["anthropic"], "anthropic_ak-9");
}

#[tokio::test]
async fn test_api_keys_accept_session_cookie() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    let user = common::create_test_user(&resources, "cookie@example.com", "long-enough-pw")
        .await
        .unwrap();
    let token = resources.codec.mint_session(&user).unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/user/api-keys")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert!(body["api_keys"].is_object());
}

#[tokio::test]
async fn test_api_keys_reject_missing_fields() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    let user = common::create_test_user(&resources, "keys@example.com", "long-enough-pw")
        .await
        .unwrap();
    let token = resources.codec.mint_login(&user).unwrap();

    let response = common::post_json_with_auth(
        &app,
        "/user/api-keys",
        json!({ "keyType": "openai" }),
        &token,
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::BAD_REQUEST)
        .await
        .unwrap();
    assert_eq!(body["error"]["message"], "Missing keyType or apiKey");
}

#[tokio::test]
async fn test_api_keys_for_deleted_user_is_404() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    let user = common::create_test_user(&resources, "gone@example.com", "long-enough-pw")
        .await
        .unwrap();
    let token = resources.codec.mint_login(&user).unwrap();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id.to_string())
        .execute(resources.database.pool())
        .await
        .unwrap();

    let response = common::get_with_auth(&app, "/user/api-keys", Some(&token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
