use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

const DEV_TOKEN: &str = "test-token";
const SESSION_HEADER: &str = "x-session-token";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same wiring as prod, bound to an ephemeral port.
        let services = tillwerk_api::app::dev_services(DEV_TOKEN).unwrap();
        let dispatcher = tillwerk_api::app::build_dispatcher(&services).unwrap();
        let app = tillwerk_api::app::build_app(Arc::new(dispatcher));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_session_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/sessions", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "failure");
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn unknown_routes_are_not_found_envelopes() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/no/such/route", srv.base_url))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn plans_are_listed_for_authenticated_callers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/billing/plans", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "success");
    let plans = body["data"]["plans"].as_array().unwrap();
    assert!(plans.iter().any(|p| p["id"] == "starter"));
}

#[tokio::test]
async fn session_revocation_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/sessions/revoke", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .json(&json!({"token": DEV_TOKEN}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["revoked"], true);

    // the token no longer authenticates
    let res = client
        .get(format!("{}/sessions", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoke_with_missing_token_field_is_a_400_with_details() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/sessions/revoke", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["details"][0]["field"], "token");
}

#[tokio::test]
async fn malformed_json_bodies_never_reach_the_pipeline() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/sessions/revoke", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn plugin_fields_are_served_in_declaration_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/plugins/receipt-printer/fields", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let fields = body["data"]["fields"].as_array().unwrap();

    let names: Vec<&str> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["printer_url", "copies", "footer"]);
    assert_eq!(fields[0]["kind"], "url");
    assert_eq!(fields[1]["default"], 1);
    assert_eq!(fields[2]["required"], false);
}

#[tokio::test]
async fn plugin_configuration_validates_and_persists() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/plugins/receipt-printer/config", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .json(&json!({"printer_url": "not a url"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/plugins/receipt-printer/config", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .json(&json!({"printer_url": "http://printer.local:9100"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["config"]["copies"], 1);
}

#[tokio::test]
async fn receipt_mutation_answers_with_delivery_info() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/billing/receipts", srv.base_url))
        .header(SESSION_HEADER, DEV_TOKEN)
        .json(&json!({
            "to": "customer@example.com",
            "order": "WS-7",
            "total_cents": 4200,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert!(!body["data"]["message_id"].as_str().unwrap().is_empty());
}
