//! HTTP tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`tl-cli migrate`)
//! - The storefront running (`cargo run -p threadline-storefront`)
//!
//! `STOREFRONT_BASE_URL` defaults to `http://localhost:3000`.

use reqwest::header::{CONTENT_SECURITY_POLICY, LOCATION};
use reqwest::{Client, StatusCode, redirect};
use serde_json::Value;

use threadline_integration_tests::unique_tag;

fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client that keeps cookies and does not follow redirects.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

fn hx_trigger(response: &reqwest::Response) -> Value {
    let raw = response
        .headers()
        .get("HX-Trigger")
        .expect("missing HX-Trigger")
        .to_str()
        .expect("HX-Trigger is not ASCII");
    serde_json::from_str(raw).expect("HX-Trigger is not JSON")
}

async fn register(client: &Client) -> String {
    let email = format!("{}@test.threadline.dev", unique_tag());
    let response = client
        .post(format!("{}/auth/register", base_url()))
        .form(&[
            ("email", email.as_str()),
            ("password", "correct horse battery"),
            ("password_confirm", "correct horse battery"),
        ])
        .send()
        .await
        .expect("register request failed");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    email
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_health_endpoints() {
    let client = client();

    let live = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(live.status(), StatusCode::OK);

    let ready = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_pages_carry_security_headers() {
    let response = client()
        .get(format!("{}/products", base_url()))
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let csp = response
        .headers()
        .get(CONTENT_SECURITY_POLICY)
        .and_then(|v| v.to_str().ok())
        .expect("missing CSP");
    assert!(csp.contains("'nonce-"));
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-content-type-options"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_page_redirects_anonymous_shopper() {
    let response = client()
        .get(format!("{}/cart", base_url()))
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/auth/login")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_htmx_action_without_session_gets_hx_redirect() {
    let response = client()
        .post(format!("{}/wishlist/toggle", base_url()))
        .header("HX-Request", "true")
        .form(&[("variant_id", "1")])
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("HX-Redirect").and_then(|v| v.to_str().ok()),
        Some("/auth/login")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_anonymous_add_to_cart_is_an_error_toast() {
    let response = client()
        .post(format!("{}/cart/add", base_url()))
        .header("HX-Request", "true")
        .form(&[("variant_size_id", "1"), ("quantity", "1")])
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let trigger = hx_trigger(&response);
    assert!(trigger["toast"]["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_sku_add_is_an_error_toast() {
    let client = client();
    register(&client).await;

    let response = client
        .post(format!("{}/cart/add", base_url()))
        .header("HX-Request", "true")
        .form(&[("variant_size_id", i32::MAX.to_string()), ("quantity", "1".to_owned())])
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let trigger = hx_trigger(&response);
    assert!(trigger["toast"]["error"].is_string());
    assert!(trigger.get("cart-updated").is_none());
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_registered_shopper_sees_account_and_empty_cart() {
    let client = client();
    let email = register(&client).await;

    let account = client
        .get(format!("{}/account", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(account.status(), StatusCode::OK);
    let body = account.text().await.expect("body");
    assert!(body.contains(&email));

    let count = client
        .get(format!("{}/cart/count", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(count.status(), StatusCode::OK);

    let logout = client
        .post(format!("{}/auth/logout", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);

    let after = client
        .get(format!("{}/account", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_login_with_wrong_password_redirects_with_error() {
    let response = client()
        .post(format!("{}/auth/login", base_url()))
        .form(&[
            ("email", format!("{}@test.threadline.dev", unique_tag())),
            ("password", "not the password".to_owned()),
        ])
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/auth/login?error=credentials")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_product_is_not_found() {
    let response = client()
        .get(format!("{}/products/{}", base_url(), i32::MAX))
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
