use std::net::SocketAddr;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use teatrade_api::{AppState, build_app, build_verifier};
use teatrade_auth::TokenClaims;
use teatrade_infra::{InMemoryDatabase, Settings};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with("").await
    }

    /// `extra` is TOML appended to the test defaults.
    async fn spawn_with(extra: &str) -> Self {
        let toml = format!("[auth]\nsecret = \"{JWT_SECRET}\"\n{extra}");
        let settings = Settings::from_toml(&toml).expect("test settings");
        let jwt = build_verifier(&settings.auth).expect("verifier");
        let state = AppState::new(std::sync::Arc::new(InMemoryDatabase::new()), jwt, settings);

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: &str, groups: &[&str]) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: sub.to_string(),
        email: Some(format!("{sub}@example.com")),
        name: None,
        groups: groups.iter().map(|g| g.to_string()).collect(),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
        iss: None,
        aud: None,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn user_token() -> String {
    mint_jwt("trader-1", &[])
}

fn admin_token() -> String {
    mint_jwt("boss-1", &["admin"])
}

fn stock_body(lot_no: &str, packages: u32) -> Value {
    json!({
        "lot_no": lot_no,
        "invoice_no": "INV-1",
        "garden": "Kenmare",
        "grade": "BP1",
        "packages": packages,
        "net_weight_kg": f64::from(packages) * 60.0,
        "purchase_price_per_kg": 2.5,
        "warehouse": "Mombasa-3",
        "purchased_on": "2024-03-01",
    })
}

async fn create_stock(client: &reqwest::Client, srv: &TestServer, token: &str, lot_no: &str, packages: u32) -> Value {
    let res = client
        .post(srv.url("/stocks"))
        .bearer_auth(token)
        .json(&stock_body(lot_no, packages))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn get_stock(client: &reqwest::Client, srv: &TestServer, token: &str, id: &str) -> Value {
    let res = client
        .get(srv.url(&format!("/stocks/{id}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/stocks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Authentication required");

    let res = client
        .get(srv.url("/stocks"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/health"))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-abc-123");

    let res = client.get(srv.url("/health")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok(), "expected a UUID, got {generated}");

    // Error responses carry it too.
    let res = client.get(srv.url("/stocks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn me_registers_then_refreshes_the_caller() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/me"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["user"]["sub"], "boss-1");
    assert_eq!(first["user"]["role"], "admin");
    assert!(first["roles"].as_array().unwrap().iter().any(|r| r == "admin"));

    let res = client
        .get(srv.url("/me"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    let second: Value = res.json().await.unwrap();
    assert_eq!(second["user"]["id"], first["user"]["id"]);
}

#[tokio::test]
async fn invalid_body_reports_every_violation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/stocks"))
        .bearer_auth(user_token())
        .json(&json!({ "lot_no": "", "packages": "many" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("lot_no must not be empty"), "{message}");
    assert!(message.contains("packages must be an integer"), "{message}");
    assert!(message.contains("warehouse is required"), "{message}");
}

#[tokio::test]
async fn malformed_path_id_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/stocks/not-a-uuid"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("id"));
}

#[tokio::test]
async fn unreadable_body_still_reports_path_violations() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url("/stocks/not-a-uuid"))
        .bearer_auth(user_token())
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "fail");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("id must be a valid UUID"), "{message}");
    assert!(message.contains("body must be valid JSON"), "{message}");
}

#[tokio::test]
async fn stock_crud_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = user_token();

    let created = create_stock(&client, &srv, &token, "LOT-1", 40).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["packages"], 40);

    // Same natural key again.
    let res = client
        .post(srv.url("/stocks"))
        .bearer_auth(&token)
        .json(&stock_body("LOT-1", 10))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "record already exists");

    create_stock(&client, &srv, &token, "LOT-2", 5).await;

    let res = client
        .get(srv.url("/stocks?lot_no=LOT-2"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["lot_no"], "LOT-2");

    let res = client
        .get(srv.url("/stocks?limit=1&page=2"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let mut update = stock_body("LOT-1", 38);
    update["warehouse"] = json!("Mombasa-7");
    let res = client
        .put(srv.url(&format!("/stocks/{id}")))
        .bearer_auth(&token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["warehouse"], "Mombasa-7");
    assert_eq!(updated["created_at"], created["created_at"]);

    let res = client
        .get(srv.url(&format!("/stocks/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deletes_are_admin_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let stock = create_stock(&client, &srv, &user_token(), "LOT-9", 3).await;
    let id = stock["id"].as_str().unwrap();

    let res = client
        .delete(srv.url(&format!("/stocks/{id}")))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&format!("/stocks/{id}")))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url(&format!("/stocks/{id}")))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_lot_deducts_and_restores_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = user_token();

    let stock = create_stock(&client, &srv, &token, "LOT-OUT", 10).await;
    let stock_id = stock["id"].as_str().unwrap().to_string();

    let out_lot = |packages: u32| {
        json!({
            "stock_id": stock_id,
            "buyer": "Acme Blenders",
            "packages": packages,
            "price_per_kg": 3.1,
            "released_on": "2024-04-02",
        })
    };

    let res = client
        .post(srv.url("/out-lots"))
        .bearer_auth(&token)
        .json(&out_lot(4))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let out_lot_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(get_stock(&client, &srv, &token, &stock_id).await["packages"], 6);

    let res = client
        .post(srv.url("/out-lots"))
        .bearer_auth(&token)
        .json(&out_lot(7))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("insufficient stock"));
    // The failed release left the lot untouched.
    assert_eq!(get_stock(&client, &srv, &token, &stock_id).await["packages"], 6);

    let res = client
        .delete(srv.url(&format!("/out-lots/{out_lot_id}")))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(get_stock(&client, &srv, &token, &stock_id).await["packages"], 10);
}

#[tokio::test]
async fn out_lot_for_unknown_stock_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/out-lots"))
        .bearer_auth(user_token())
        .json(&json!({
            "stock_id": uuid::Uuid::new_v4(),
            "buyer": "Acme Blenders",
            "packages": 1,
            "price_per_kg": 3.1,
            "released_on": "2024-04-02",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "stock not found");
}

#[tokio::test]
async fn shipment_status_follows_the_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = user_token();

    let stock = create_stock(&client, &srv, &token, "LOT-SHIP", 20).await;

    let res = client
        .post(srv.url("/shipments"))
        .bearer_auth(&token)
        .json(&json!({
            "shipment_no": "SHP-001",
            "buyer": "Harbour Teas",
            "destination": "Karachi",
            "items": [{ "stock_id": stock["id"], "packages": 12 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let shipment: Value = res.json().await.unwrap();
    assert_eq!(shipment["status"], "pending");
    let id = shipment["id"].as_str().unwrap().to_string();
    let status_url = srv.url(&format!("/shipments/{id}/status"));

    let res = client
        .patch(&status_url)
        .bearer_auth(&token)
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .patch(&status_url)
        .bearer_auth(&token)
        .json(&json!({ "status": "in_transit", "on": "2024-05-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let moved: Value = res.json().await.unwrap();
    assert_eq!(moved["status"], "in_transit");
    assert_eq!(moved["shipped_on"], "2024-05-01");

    let res = client
        .patch(&status_url)
        .bearer_auth(&token)
        .json(&json!({ "status": "lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("status must be one of"));
}

#[tokio::test]
async fn shipment_items_must_reference_existing_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/shipments"))
        .bearer_auth(user_token())
        .json(&json!({
            "shipment_no": "SHP-404",
            "buyer": "Harbour Teas",
            "destination": "Karachi",
            "items": [{ "stock_id": uuid::Uuid::new_v4(), "packages": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "items[0].stock_id does not match any stock lot");
}

#[tokio::test]
async fn favorites_are_private_to_their_owner() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = mint_jwt("alice", &[]);
    let bob = mint_jwt("bob", &[]);

    let stock = create_stock(&client, &srv, &alice, "LOT-FAV", 2).await;
    let favorite = json!({ "target_kind": "stock", "target_id": stock["id"] });

    let res = client
        .post(srv.url("/favorites"))
        .bearer_auth(&alice)
        .json(&favorite)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/favorites"))
        .bearer_auth(&alice)
        .json(&favorite)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client.get(srv.url("/favorites")).bearer_auth(&bob).send().await.unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total"], 0);

    let res = client
        .delete(srv.url(&format!("/favorites/{id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&format!("/favorites/{id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .post(srv.url("/favorites"))
        .bearer_auth(&alice)
        .json(&json!({ "target_kind": "catalog", "target_id": uuid::Uuid::new_v4() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_can_change_user_roles() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/me")).bearer_auth(user_token()).send().await.unwrap();
    let me: Value = res.json().await.unwrap();
    let user_id = me["user"]["id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/admin/users"))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .patch(srv.url(&format!("/admin/users/{user_id}/role")))
        .bearer_auth(admin_token())
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["role"], "admin");

    let res = client
        .get(srv.url("/admin/users?role=admin"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn stock_csv_upload_imports_every_row() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = user_token();

    let csv = "Lot No,Invoice No,Garden,Grade,Packages,Net Weight Kg,Purchase Price Per Kg,Warehouse,Purchased On\n\
               U-1,INV-7,Kenmare,BP1,10,600,2.4,Mombasa-3,2024-02-01\n\
               U-2,INV-7,Kenmare,PF1,8,480,2.2,Mombasa-3,2024-02-01\n";
    let part = reqwest::multipart::Part::bytes(csv.as_bytes().to_vec())
        .file_name("stock.csv")
        .mime_str("text/csv")
        .unwrap();
    let res = client
        .post(srv.url("/stocks/upload"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["imported"], 2);

    let res = client
        .get(srv.url("/stocks/export"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let exported = res.text().await.unwrap();
    assert!(exported.contains("U-1"));
    assert!(exported.contains("U-2"));
}

#[tokio::test]
async fn upload_with_unsupported_type_counts_as_missing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let part = reqwest::multipart::Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("stock.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let res = client
        .post(srv.url("/stocks/upload"))
        .bearer_auth(user_token())
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "no file uploaded");
}

#[tokio::test]
async fn oversized_upload_counts_as_missing() {
    let srv = TestServer::spawn_with("[uploads]\nmax_bytes = 1024\n").await;
    let client = reqwest::Client::new();

    let part = reqwest::multipart::Part::bytes(vec![b'a'; 4096])
        .file_name("stock.csv")
        .mime_str("text/csv")
        .unwrap();
    let res = client
        .post(srv.url("/stocks/upload"))
        .bearer_auth(user_token())
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "no file uploaded");
}

#[tokio::test]
async fn contact_form_is_rate_limited_per_client() {
    let srv = TestServer::spawn_with("[rate_limit]\ncapacity = 5\nwindow_secs = 1\n").await;
    let client = reqwest::Client::new();
    let message = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "Do you stock Assam CTC?",
    });

    for _ in 0..5 {
        let res = client.post(srv.url("/contact")).json(&message).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "success");
    }

    let res = client.post(srv.url("/contact")).json(&message).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Rate limit exceeded. Try again later.");

    // Invalid submissions still count against the window.
    let res = client.post(srv.url("/contact")).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let res = client.post(srv.url("/contact")).json(&message).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn contact_reply_quotes_the_request_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let message = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "Please send the March catalog.",
    });

    let res = client
        .post(srv.url("/contact"))
        .header("x-request-id", "contact-ref-42")
        .json(&message)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-request-id"], "contact-ref-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reference"], "contact-ref-42");

    // A minted id reaches the handler unchanged too.
    let res = client.post(srv.url("/contact")).json(&message).send().await.unwrap();
    let echoed = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reference"], echoed.as_str());
}

#[tokio::test]
async fn contact_form_validates_before_storing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/contact"))
        .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "message is required");
}
