// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Session and Account Integration Tests
//!
//! ## Test Categories
//!
//! - `test_login_*`: Password login and admin login
//! - `test_refresh_*`: Refresh token redemption
//! - `test_register_*`: Captcha-backed registration
//! - `test_account_*`: Password/profile changes, freeze and listing
//! - `test_seed_*`: Demo data endpoint

use axum::http::StatusCode;
use serde_json::json;
use roombook_tests::common::{TestApp, ALICE, BOB, CARL, ROOT};

const REFRESH_EXPIRED: &str = "token expired, please log in again";

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_user_and_tokens() {
    let app = TestApp::new();
    app.create(ALICE).await;

    let response = app.login(ALICE.username, ALICE.password).await;

    assert_eq!(response.status, StatusCode::OK);
    let info = &response.body["userInfo"];
    assert_eq!(info["username"], "alice");
    assert_eq!(info["isFrozen"], false);
    assert_eq!(info["roles"], json!(["editor"]));
    assert_eq!(info["permissions"], json!(["ddd"]));
    assert!(response.body["accessToken"].as_str().is_some());
    assert!(response.body["refreshToken"].as_str().is_some());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new();
    app.create(ALICE).await;

    app.login(ALICE.username, "wrong-password")
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "invalid username or password");
    app.login("nobody", "whatever")
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "invalid username or password");
}

#[tokio::test]
async fn test_login_validates_body() {
    let app = TestApp::new();

    app.login("", "")
        .await
        .assert_envelope(
            StatusCode::BAD_REQUEST,
            "username must not be empty,password must not be empty",
        );
}

#[tokio::test]
async fn test_login_frozen_account() {
    let app = TestApp::new();
    let bob = app.create(BOB).await;
    app.store().freeze_user(bob.id).await.unwrap();

    app.login(BOB.username, BOB.password)
        .await
        .assert_envelope(StatusCode::FORBIDDEN, "account is frozen");
}

#[tokio::test]
async fn test_login_admin_requires_admin_account() {
    let app = TestApp::new();
    app.create(ROOT).await;
    app.create(CARL).await;

    let response = app
        .post_json(
            "/user/admin/login",
            json!({ "username": ROOT.username, "password": ROOT.password }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userInfo"]["isAdmin"], true);

    app.post_json(
        "/user/admin/login",
        json!({ "username": CARL.username, "password": CARL.password }),
        None,
    )
    .await
    .assert_envelope(StatusCode::FORBIDDEN, "administrator account required");
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_issues_working_pair() {
    let app = TestApp::new();
    app.create(ALICE).await;

    let login = app.login(ALICE.username, ALICE.password).await;
    let refresh_token = login.body["refreshToken"].as_str().unwrap();

    let response = app
        .get(&format!("/user/refresh?refreshToken={}", refresh_token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let access = response.body["accessToken"].as_str().unwrap();
    assert!(response.body["refreshToken"].as_str().is_some());

    let response = app.get("/aaa", Some(&format!("Bearer {}", access))).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_picks_up_role_changes() {
    let app = TestApp::new();
    let carl = app.create(CARL).await;

    let login = app.login(CARL.username, CARL.password).await;
    let refresh_token = login.body["refreshToken"].as_str().unwrap().to_string();

    app.store().define_role("auditor", &["ddd"]).await.unwrap();
    app.store().set_user_roles(carl.id, &["auditor"]).await.unwrap();

    let response = app
        .get(&format!("/user/refresh?refreshToken={}", refresh_token), None)
        .await;
    let access = response.body["accessToken"].as_str().unwrap();

    let response = app.get("/aaa", Some(&format!("Bearer {}", access))).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_bad_tokens() {
    let app = TestApp::new();
    app.create(ALICE).await;
    let login = app.login(ALICE.username, ALICE.password).await;
    let access = login.body["accessToken"].as_str().unwrap();

    app.get(&format!("/user/refresh?refreshToken={}", access), None)
        .await
        .assert_envelope(StatusCode::UNAUTHORIZED, REFRESH_EXPIRED);
    app.get("/user/refresh?refreshToken=junk", None)
        .await
        .assert_envelope(StatusCode::UNAUTHORIZED, REFRESH_EXPIRED);
    app.get("/user/refresh", None)
        .await
        .assert_envelope(StatusCode::UNAUTHORIZED, REFRESH_EXPIRED);
}

#[tokio::test]
async fn test_refresh_frozen_account() {
    let app = TestApp::new();
    let bob = app.create(BOB).await;
    let login = app.login(BOB.username, BOB.password).await;
    let refresh_token = login.body["refreshToken"].as_str().unwrap().to_string();

    app.store().freeze_user(bob.id).await.unwrap();

    app.get(&format!("/user/refresh?refreshToken={}", refresh_token), None)
        .await
        .assert_envelope(StatusCode::FORBIDDEN, "account is frozen");
}

#[tokio::test]
async fn test_refresh_admin_scope() {
    let app = TestApp::new();
    app.create(ROOT).await;
    app.create(CARL).await;

    let root = app.login(ROOT.username, ROOT.password).await;
    let token = root.body["refreshToken"].as_str().unwrap();
    let response = app
        .get(&format!("/user/admin/refresh?refreshToken={}", token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let carl = app.login(CARL.username, CARL.password).await;
    let token = carl.body["refreshToken"].as_str().unwrap();
    app.get(&format!("/user/admin/refresh?refreshToken={}", token), None)
        .await
        .assert_envelope(StatusCode::UNAUTHORIZED, REFRESH_EXPIRED);
}

// =============================================================================
// Registration
// =============================================================================

fn registration(username: &str, email: &str, captcha: &str) -> serde_json::Value {
    json!({
        "username": username,
        "nickName": "Dana",
        "password": "dana-secret",
        "email": email,
        "captcha": captcha,
    })
}

#[tokio::test]
async fn test_register_with_mailed_code() {
    let app = TestApp::new();

    let response = app
        .get("/user/register-captcha?address=dana@example.com", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "sent");

    let code = app.last_code("dana@example.com").unwrap();
    assert_eq!(code.len(), 6);

    let response = app
        .post_json(
            "/user/register",
            registration("dana", "dana@example.com", &code),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "registered");

    let response = app.login("dana", "dana-secret").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userInfo"]["nickName"], "Dana");
}

#[tokio::test]
async fn test_register_code_is_single_use() {
    let app = TestApp::new();
    app.get("/user/register-captcha?address=dana@example.com", None)
        .await;
    let code = app.last_code("dana@example.com").unwrap();

    let first = app
        .post_json("/user/register", registration("dana", "dana@example.com", &code), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);

    app.post_json("/user/register", registration("dana2", "dana@example.com", &code), None)
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "verification code has expired");
}

#[tokio::test]
async fn test_register_wrong_code() {
    let app = TestApp::new();
    app.get("/user/register-captcha?address=dana@example.com", None)
        .await;
    let code = app.last_code("dana@example.com").unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    app.post_json("/user/register", registration("dana", "dana@example.com", wrong), None)
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "verification code is incorrect");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new();
    app.create(ALICE).await;

    app.get("/user/register-captcha?address=other@example.com", None)
        .await;
    let code = app.last_code("other@example.com").unwrap();

    app.post_json("/user/register", registration("alice", "other@example.com", &code), None)
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "user already exists");
}

#[tokio::test]
async fn test_register_validation_messages() {
    let app = TestApp::new();

    let body = json!({
        "username": "",
        "nickName": "x",
        "password": "123",
        "email": "not-an-email",
        "captcha": "",
    });
    app.post_json("/user/register", body, None)
        .await
        .assert_envelope(
            StatusCode::BAD_REQUEST,
            "username must not be empty,password must be at least 6 characters,email is not a valid address,captcha must not be empty",
        );
}

#[tokio::test]
async fn test_register_captcha_rejects_bad_address() {
    let app = TestApp::new();

    app.get("/user/register-captcha?address=nope", None)
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "address is not a valid email");
}

// =============================================================================
// Account Management
// =============================================================================

#[tokio::test]
async fn test_account_update_password() {
    let app = TestApp::new();
    app.create(ALICE).await;
    let bearer = app.bearer(ALICE).await;

    app.get(
        &format!("/user/update_password/captcha?address={}", ALICE.email),
        None,
    )
    .await;
    let code = app.last_code(ALICE.email).unwrap();

    let response = app
        .post_json(
            "/user/update_password",
            json!({ "password": "brand-new-secret", "email": ALICE.email, "captcha": code }),
            Some(&bearer),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "password updated");

    assert_eq!(
        app.login(ALICE.username, ALICE.password).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.login(ALICE.username, "brand-new-secret").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_account_update_password_requires_login() {
    let app = TestApp::new();

    app.post_json(
        "/user/update_password",
        json!({ "password": "brand-new-secret", "email": "a@example.com", "captcha": "123456" }),
        None,
    )
    .await
    .assert_envelope(StatusCode::UNAUTHORIZED, "not logged in");
}

#[tokio::test]
async fn test_account_update_password_email_must_match() {
    let app = TestApp::new();
    app.create(ALICE).await;
    let bearer = app.bearer(ALICE).await;

    app.post_json(
        "/user/update_password",
        json!({ "password": "brand-new-secret", "email": BOB.email, "captcha": "123456" }),
        Some(&bearer),
    )
    .await
    .assert_envelope(StatusCode::BAD_REQUEST, "email does not match account");
}

#[tokio::test]
async fn test_account_update_profile() {
    let app = TestApp::new();
    app.create(ALICE).await;
    let bearer = app.bearer(ALICE).await;

    app.get(&format!("/user/update/captcha?address={}", ALICE.email), None)
        .await;
    let code = app.last_code(ALICE.email).unwrap();

    let response = app
        .post_json(
            "/user/update",
            json!({
                "nickName": "Alice L.",
                "headPic": "https://example.com/alice.png",
                "email": ALICE.email,
                "captcha": code,
            }),
            Some(&bearer),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let info = app.get("/user/info", Some(&bearer)).await;
    assert_eq!(info.body["nickName"], "Alice L.");
    assert_eq!(info.body["headPic"], "https://example.com/alice.png");
}

#[tokio::test]
async fn test_account_freeze() {
    let app = TestApp::new();
    app.create(ROOT).await;
    let bob = app.create(BOB).await;
    let bearer = app.bearer(ROOT).await;

    let response = app
        .get(&format!("/user/freeze?id={}", bob.id), Some(&bearer))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, true);

    app.login(BOB.username, BOB.password)
        .await
        .assert_envelope(StatusCode::FORBIDDEN, "account is frozen");

    app.get("/user/freeze?id=abc", Some(&bearer))
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "id must be a number");
}

#[tokio::test]
async fn test_account_list_pagination_and_filter() {
    let app = TestApp::new();
    app.create(ALICE).await;
    app.create(BOB).await;
    app.create(CARL).await;
    let bearer = app.bearer(ALICE).await;

    let response = app.get("/user/list?index=1&size=2", Some(&bearer)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["totalCount"], 3);
    assert_eq!(response.body["users"].as_array().unwrap().len(), 2);

    let response = app.get("/user/list?username=bo", Some(&bearer)).await;
    assert_eq!(response.body["totalCount"], 1);
    assert_eq!(response.body["users"][0]["username"], "bob");
}

#[tokio::test]
async fn test_account_list_rejects_bad_paging() {
    let app = TestApp::new();
    app.create(ALICE).await;
    let bearer = app.bearer(ALICE).await;

    app.get("/user/list?index=abc", Some(&bearer))
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "index must be a number");
    app.get("/user/list?size=0", Some(&bearer))
        .await
        .assert_envelope(StatusCode::BAD_REQUEST, "size must be greater than 0");
}

// =============================================================================
// Demo Data
// =============================================================================

#[tokio::test]
async fn test_seed_endpoint_is_idempotent() {
    let app = TestApp::new();

    for _ in 0..2 {
        let response = app.get("/user/init-data", None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "done");
    }

    let response = app
        .post_json(
            "/user/admin/login",
            json!({ "username": "zhangsan", "password": "111111" }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userInfo"]["roles"], json!(["admin"]));

    let lisi = app.login("lisi", "222222").await;
    let bearer = format!("Bearer {}", lisi.body["accessToken"].as_str().unwrap());
    app.get("/aaa", Some(&bearer))
        .await
        .assert_envelope(StatusCode::FORBIDDEN, "insufficient permissions");
}
