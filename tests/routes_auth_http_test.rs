// ABOUTME: HTTP tests for signup, direct login, and the captcha-guarded flow
// ABOUTME: Covers cookie issuance, tenant callbacks, and single-use captcha enforcement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Parley Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::{header, StatusCode};
use parley_auth::models::Tenant;
use serde_json::json;

#[tokio::test]
async fn test_signup_then_direct_login_sets_cookie() {
    let (app, _resources, _cache) = common::create_test_app().await.unwrap();

    let response = common::post_json(
        &app,
        "/signup",
        json!({ "email": "alice@example.com", "password": "long-enough-pw" }),
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::CREATED).await.unwrap();
    assert!(!body["user_id"].as_str().unwrap().is_empty());

    let response = common::post_json(
        &app,
        "/login",
        json!({ "email": "alice@example.com", "password": "long-enough-pw" }),
    )
    .await
    .unwrap();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=3600"));

    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body.get("callback_url").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_is_400() {
    let (app, _resources, _cache) = common::create_test_app().await.unwrap();

    let payload = json!({ "email": "dup@example.com", "password": "long-enough-pw" });
    common::post_json(&app, "/signup", payload.clone()).await.unwrap();

    let response = common::post_json(&app, "/signup", payload).await.unwrap();
    let body = common::expect_status(response, StatusCode::BAD_REQUEST)
        .await
        .unwrap();
    assert_eq!(body["error"]["message"], "User already exists");
}

#[tokio::test]
async fn test_signup_validation() {
    let (app, _resources, _cache) = common::create_test_app().await.unwrap();

    // Missing password
    let response = common::post_json(&app, "/signup", json!({ "email": "a@b.cd" }))
        .await
        .unwrap();
    common::expect_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    // Malformed email
    let response = common::post_json(
        &app,
        "/signup",
        json!({ "email": "not-an-email", "password": "long-enough-pw" }),
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    // Short password
    let response = common::post_json(
        &app,
        "/signup",
        json!({ "email": "a@b.cd", "password": "short" }),
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_direct_login_bad_credentials_are_constant_shape() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    common::create_test_user(&resources, "bob@example.com", "right-password")
        .await
        .unwrap();

    for (email, password) in [
        ("bob@example.com", "wrong-password"),
        ("ghost@example.com", "right-password"),
    ] {
        let response = common::post_json(
            &app,
            "/login",
            json!({ "email": email, "password": password }),
        )
        .await
        .unwrap();
        let body = common::expect_status(response, StatusCode::UNAUTHORIZED)
            .await
            .unwrap();
        assert_eq!(body["error"]["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_direct_login_resolves_tenant_callback() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    common::create_test_user(&resources, "bob@example.com", "right-password")
        .await
        .unwrap();
    resources
        .database
        .upsert_tenant(&Tenant {
            tenant_key: "acme".into(),
            callback_url: "https://acme.test/welcome".into(),
        })
        .await
        .unwrap();

    let response = common::post_json(
        &app,
        "/login",
        json!({ "email": "bob@example.com", "password": "right-password", "tenant_key": "acme" }),
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["callback_url"], "https://acme.test/welcome");

    // Unknown tenant keys degrade to no callback, not an error
    let response = common::post_json(
        &app,
        "/login",
        json!({ "email": "bob@example.com", "password": "right-password", "tenant_key": "ghost" }),
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert!(body.get("callback_url").is_none());
}

#[tokio::test]
async fn test_captcha_endpoint_issues_svg_challenge() {
    let (app, _resources, _cache) = common::create_test_app().await.unwrap();

    let response = common::get_with_auth(&app, "/auth/captcha", None).await.unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();

    assert!(!body["id"].as_str().unwrap().is_empty());
    let svg = body["data"].as_str().unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("<text"));
}

#[tokio::test]
async fn test_captcha_login_happy_path_and_single_use() {
    let (app, resources, cache) = common::create_test_app().await.unwrap();
    common::create_test_user(&resources, "carol@example.com", "right-password")
        .await
        .unwrap();

    let captcha_id = common::plant_captcha(&cache, "AB34").await.unwrap();

    let payload = json!({
        "email": "carol@example.com",
        "password": "right-password",
        "captchaId": captcha_id,
        "captchaValue": "ab34",
    });

    let response = common::post_json(&app, "/auth/login", payload.clone()).await.unwrap();
    let body = common::expect_status(response, StatusCode::OK).await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "carol@example.com");

    // Same captcha id again: consumed on first use, even with the right answer
    let response = common::post_json(&app, "/auth/login", payload).await.unwrap();
    let body = common::expect_status(response, StatusCode::BAD_REQUEST)
        .await
        .unwrap();
    assert_eq!(body["error"]["message"], "Invalid CAPTCHA");
}

#[tokio::test]
async fn test_captcha_login_wrong_answer_consumes_challenge() {
    let (app, resources, cache) = common::create_test_app().await.unwrap();
    common::create_test_user(&resources, "carol@example.com", "right-password")
        .await
        .unwrap();

    let captcha_id = common::plant_captcha(&cache, "AB34").await.unwrap();

    // Wrong answer fails before any password comparison
    let response = common::post_json(
        &app,
        "/auth/login",
        json!({
            "email": "carol@example.com",
            "password": "right-password",
            "captchaId": captcha_id,
            "captchaValue": "zzzz",
        }),
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    // The failed attempt burned the challenge
    let response = common::post_json(
        &app,
        "/auth/login",
        json!({
            "email": "carol@example.com",
            "password": "right-password",
            "captchaId": captcha_id,
            "captchaValue": "ab34",
        }),
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_captcha_login_missing_captcha_fails_closed() {
    let (app, resources, _cache) = common::create_test_app().await.unwrap();
    common::create_test_user(&resources, "carol@example.com", "right-password")
        .await
        .unwrap();

    let response = common::post_json(
        &app,
        "/auth/login",
        json!({ "email": "carol@example.com", "password": "right-password" }),
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::BAD_REQUEST)
        .await
        .unwrap();
    assert_eq!(body["error"]["message"], "CAPTCHA is required");
}

#[tokio::test]
async fn test_captcha_signup_round_trip() {
    let (app, _resources, cache) = common::create_test_app().await.unwrap();

    let captcha_id = common::plant_captcha(&cache, "XY78").await.unwrap();
    let response = common::post_json(
        &app,
        "/auth/signup",
        json!({
            "name": "Dora",
            "email": "dora@example.com",
            "password": "long-enough-pw",
            "confirmPassword": "long-enough-pw",
            "captchaId": captcha_id,
            "captchaValue": "xy78",
        }),
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(body["user"]["display_name"], "Dora");

    // Duplicate email on the captcha-guarded endpoint answers 409
    let captcha_id = common::plant_captcha(&cache, "XY78").await.unwrap();
    let response = common::post_json(
        &app,
        "/auth/signup",
        json!({
            "name": "Dora",
            "email": "dora@example.com",
            "password": "long-enough-pw",
            "confirmPassword": "long-enough-pw",
            "captchaId": captcha_id,
            "captchaValue": "xy78",
        }),
    )
    .await
    .unwrap();
    common::expect_status(response, StatusCode::CONFLICT).await.unwrap();
}

#[tokio::test]
async fn test_captcha_signup_password_mismatch() {
    let (app, _resources, cache) = common::create_test_app().await.unwrap();

    let captcha_id = common::plant_captcha(&cache, "XY78").await.unwrap();
    let response = common::post_json(
        &app,
        "/auth/signup",
        json!({
            "name": "Eve",
            "email": "eve@example.com",
            "password": "long-enough-pw",
            "confirmPassword": "different-pw",
            "captchaId": captcha_id,
            "captchaValue": "xy78",
        }),
    )
    .await
    .unwrap();
    let body = common::expect_status(response, StatusCode::BAD_REQUEST)
        .await
        .unwrap();
    assert_eq!(body["error"]["message"], "Passwords do not match");
}

#[tokio::test]
async fn test_health_and_root_are_public() {
    let (app, _resources, _cache) = common::create_test_app().await.unwrap();

    for path in ["/health", "/"] {
        let response = common::get_with_auth(&app, path, None).await.unwrap();
        let body = common::expect_status(response, StatusCode::OK).await.unwrap();
        assert_eq!(body["status"], "ok");
    }
}
