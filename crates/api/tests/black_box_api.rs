use coursemart_core::{LedgerId, PrincipalId};
use coursemart_infra::LedgerConfig;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    owner: PrincipalId,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod (in-memory journal), bound to an ephemeral port.
        let owner = PrincipalId::new();
        let config = LedgerConfig {
            owner,
            ledger_id: LedgerId::new(),
            journal_dir: None,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
        };
        let app = coursemart_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            owner,
            handle,
        }
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

fn as_principal(req: reqwest::RequestBuilder, p: PrincipalId) -> reqwest::RequestBuilder {
    req.header("x-principal-id", p.to_string())
}

async fn error_code(res: reqwest::Response) -> String {
    let body: serde_json::Value = res.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn mutations_require_a_principal() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/students"))
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/students"))
        .header("x-principal-id", "not-a-uuid")
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = as_principal(client.post(srv.url("/students")), PrincipalId::new())
        .header("x-attached-value", "lots")
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn marketplace_lifecycle_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = PrincipalId::new();
    let bob = PrincipalId::new();

    // Instructor creates a course.
    let res = as_principal(client.post(srv.url("/courses")), alice)
        .json(&json!({ "title": "Rust", "description": "Ownership", "price": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["id"], 1);

    // Student registers and enrolls with an overpayment.
    let res = as_principal(client.post(srv.url("/students")), bob)
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = as_principal(client.post(srv.url("/courses/1/enroll")), bob)
        .header("x-attached-value", "120")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["price"], 100);
    assert_eq!(receipt["refunded"], 20);

    // Second enrollment is rejected regardless of payment.
    let res = as_principal(client.post(srv.url("/courses/1/enroll")), bob)
        .header("x-attached-value", "100")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "already_enrolled");

    // Complete with a rating.
    let res = as_principal(client.post(srv.url("/courses/1/complete")), bob)
        .json(&json!({ "rating": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url(&format!("/enrollments/1/{bob}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let enrollment: serde_json::Value = res.json().await.unwrap();
    assert_eq!(enrollment["is_completed"], true);
    assert_eq!(enrollment["rating"], 4);

    let res = client
        .get(srv.url(&format!("/students/{bob}/courses")))
        .send()
        .await
        .unwrap();
    let courses: serde_json::Value = res.json().await.unwrap();
    assert_eq!(courses, json!([1]));

    let course: serde_json::Value = client
        .get(srv.url("/courses/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(course["enrolled_count"], 1);
    assert_eq!(course["instructor"], alice.to_string());

    // Instructor withdraws.
    let earnings: serde_json::Value = client
        .get(srv.url(&format!("/earnings/{alice}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(earnings["earnings"], 100);

    let res = as_principal(client.post(srv.url("/earnings/withdraw")), alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let paid: serde_json::Value = res.json().await.unwrap();
    assert_eq!(paid["amount"], 100);

    let res = as_principal(client.post(srv.url("/earnings/withdraw")), alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "no_earnings");

    let summary: serde_json::Value = client
        .get(srv.url("/summary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["total_courses"], 1);
    assert_eq!(summary["total_students"], 1);
    assert_eq!(summary["owner"], srv.owner.to_string());
}

#[tokio::test]
async fn precondition_failures_map_to_statuses() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = PrincipalId::new();
    let bob = PrincipalId::new();

    let res = as_principal(client.post(srv.url("/courses")), alice)
        .json(&json!({ "title": "  ", "description": "x", "price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "empty_field");

    as_principal(client.post(srv.url("/courses")), alice)
        .json(&json!({ "title": "Rust", "description": "x", "price": 10 }))
        .send()
        .await
        .unwrap();

    // Unregistered student.
    let res = as_principal(client.post(srv.url("/courses/1/enroll")), bob)
        .header("x-attached-value", "10")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, "not_registered");

    as_principal(client.post(srv.url("/students")), bob)
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();

    let res = as_principal(client.post(srv.url("/courses/1/enroll")), bob)
        .header("x-attached-value", "9")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);

    let res = as_principal(client.post(srv.url("/courses/7/enroll")), bob)
        .header("x-attached-value", "10")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, "course_not_found");

    let res = as_principal(client.post(srv.url("/courses/1/toggle")), bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = as_principal(client.post(srv.url("/admin/emergency-withdraw")), alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "not_owner");

    let res = client.get(srv.url("/courses/0")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn value_is_refused_outside_enrollment() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = PrincipalId::new();

    let res = as_principal(client.post(srv.url("/payments")), alice)
        .header("x-attached-value", "50")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "unsupported_direct_payment");

    let res = as_principal(client.post(srv.url("/students")), alice)
        .header("x-attached-value", "1")
        .json(&json!({ "name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let registered: serde_json::Value = client
        .get(srv.url(&format!("/students/{alice}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(registered["error"], "not_found");
}

#[tokio::test]
async fn owner_sweeps_custody() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = PrincipalId::new();
    let bob = PrincipalId::new();

    as_principal(client.post(srv.url("/courses")), alice)
        .json(&json!({ "title": "Rust", "description": "x", "price": 40 }))
        .send()
        .await
        .unwrap();
    as_principal(client.post(srv.url("/students")), bob)
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    as_principal(client.post(srv.url("/courses/1/enroll")), bob)
        .header("x-attached-value", "40")
        .send()
        .await
        .unwrap();

    let res = as_principal(client.post(srv.url("/admin/emergency-withdraw")), srv.owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["amount"], 40);

    // Bookkeeping survives; the payout has nothing left to draw on.
    let res = as_principal(client.post(srv.url("/earnings/withdraw")), alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    // The payout is kept for retry rather than dropped.
    let pending: serde_json::Value = client
        .get(srv.url("/settlements/pending"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pending = pending["pending"].as_array().unwrap().clone();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["instruction"]["kind"], "payout");
    assert_eq!(pending[0]["instruction"]["amount"], 40);

    let res = as_principal(client.post(srv.url("/admin/settlements/retry")), alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = as_principal(client.post(srv.url("/admin/settlements/retry")), srv.owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["settled"], 0);
    assert_eq!(report["failed"], 1);
}
