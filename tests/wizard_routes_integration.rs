//! Integration tests for the wizard REST surface.
//!
//! Each test spins up an Axum server on a random port backed by the mock
//! agent store and drives it over HTTP with reqwest.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use agent_studio::config::WizardConfig;
use agent_studio::store::MockAgentStore;
use agent_studio::wizard::{MemoryDraftStore, WizardRouteState, WizardSessions, wizard_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an Axum server on a random port, return (base url, store).
async fn start_server() -> (String, Arc<MockAgentStore>) {
    let agents = Arc::new(MockAgentStore::new());
    let state = WizardRouteState {
        sessions: Arc::new(WizardSessions::new(
            WizardConfig::default(),
            agents.clone(),
            Arc::new(MemoryDraftStore::new()),
        )),
        default_user_id: "default".to_string(),
    };
    let app = wizard_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), agents)
}

async fn post(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn open(client: &Client, base: &str, user_id: &str) -> String {
    let (status, body) = post(client, format!("{base}/api/wizard"), json!({ "user_id": user_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["state"]["step"], "identity");
    assert_eq!(body["state"]["status"], "open");
    body["id"].as_str().unwrap().to_string()
}

async fn edit(client: &Client, base: &str, id: &str, field: &str, value: Value) -> Value {
    let (status, body) = post(
        client,
        format!("{base}/api/wizard/{id}/fields"),
        json!({ "field": field, "value": value }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn full_wizard_creates_agent() {
    timeout(TEST_TIMEOUT, async {
        let (base, agents) = start_server().await;
        let client = Client::new();
        let id = open(&client, &base, "u-int").await;

        // Empty step is blocked with inline errors.
        let (status, body) = post(&client, format!("{base}/api/wizard/{id}/next"), json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!body["errors"].as_array().unwrap().is_empty());
        assert_eq!(body["session"]["state"]["step"], "identity");
        assert!(body["session"]["errors"]["name"].is_string());

        let body = edit(&client, &base, &id, "name", json!("A")).await;
        assert_eq!(body["field_error"]["field"], "name");

        edit(&client, &base, &id, "name", json!("Support Bot")).await;
        edit(&client, &base, &id, "description", json!("Answers questions")).await;
        let body = edit(&client, &base, &id, "purpose", json!("support")).await;
        assert!(body["field_error"].is_null());

        let (status, body) = post(&client, format!("{base}/api/wizard/{id}/next"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["step"], "business");
        assert_eq!(body["view"]["number"], 2);

        // Cannot skip ahead.
        let (status, _) = post(&client, format!("{base}/api/wizard/{id}/jump"), json!({ "step": 4 })).await;
        assert_eq!(status, StatusCode::CONFLICT);

        edit(&client, &base, &id, "industry", json!("SaaS")).await;
        let (status, body) = post(
            &client,
            format!("{base}/api/wizard/{id}/template"),
            json!({ "use_case": "customer_support" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["form"]["use_case"], "customer_support");

        for expected in ["knowledge", "behavior", "deployment"] {
            let (status, body) = post(&client, format!("{base}/api/wizard/{id}/next"), json!({})).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["state"]["step"], expected);
        }

        edit(&client, &base, &id, "personality_tone", json!(70)).await;

        let (status, body) = post(&client, format!("{base}/api/wizard/{id}/submit"), json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["agent"]["name"], "Support Bot");
        assert_eq!(body["agent"]["temperature"], 0.7);
        assert_eq!(body["agent"]["user_id"], "u-int");
        assert_eq!(body["session"]["state"]["status"], "submitted");
        assert_eq!(body["session"]["notifications"][0]["level"], "success");
        assert_eq!(agents.len().await, 1);
        let agent_id = body["agent"]["id"].as_str().unwrap().to_string();

        // Closed sessions are released.
        let resp = client.get(format!("{base}/api/wizard/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let list: Value = client
            .get(format!("{base}/api/agents?user_id=u-int"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);

        let resp = client
            .patch(format!("{base}/api/agents/{agent_id}"))
            .json(&json!({ "is_active": false }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Value = resp.json().await.unwrap();
        assert_eq!(updated["is_active"], false);

        let resp = client.delete(format!("{base}/api/agents/{agent_id}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = client.get(format!("{base}/api/agents/{agent_id}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn store_failure_is_bad_gateway_and_keeps_session() {
    timeout(TEST_TIMEOUT, async {
        let (base, agents) = start_server().await;
        let client = Client::new();
        let id = open(&client, &base, "u-fail").await;

        edit(&client, &base, &id, "name", json!("Support Bot")).await;
        edit(&client, &base, &id, "description", json!("Answers questions")).await;
        edit(&client, &base, &id, "purpose", json!("support")).await;
        post(&client, format!("{base}/api/wizard/{id}/next"), json!({})).await;
        edit(&client, &base, &id, "industry", json!("SaaS")).await;
        post(
            &client,
            format!("{base}/api/wizard/{id}/template"),
            json!({ "use_case": "faq_bot" }),
        )
        .await;
        for _ in 0..3 {
            let (status, _) = post(&client, format!("{base}/api/wizard/{id}/next"), json!({})).await;
            assert_eq!(status, StatusCode::OK);
        }

        agents.fail_next("service unavailable").await;
        let (status, body) = post(&client, format!("{base}/api/wizard/{id}/submit"), json!({})).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["session"]["state"]["step"], "deployment");
        assert_eq!(body["session"]["state"]["status"], "open");
        assert_eq!(body["session"]["form"]["name"], "Support Bot");
        assert_eq!(body["session"]["notifications"][0]["level"], "error");

        let resp = client.get(format!("{base}/api/wizard/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn files_draft_and_cancel() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let client = Client::new();
        let id = open(&client, &base, "u-draft").await;

        let (status, body) = post(
            &client,
            format!("{base}/api/wizard/{id}/files"),
            json!({ "files": [
                { "name": "faq.pdf", "size": 2048, "mime_type": "application/pdf" },
                { "name": "photo.png", "size": 2048, "mime_type": "image/png" }
            ]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"]["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(body["selection"]["rejected"][0]["name"], "photo.png");
        assert_eq!(body["session"]["form"]["files"].as_array().unwrap().len(), 1);

        let (status, body) = post(
            &client,
            format!("{base}/api/wizard/{id}/files/remove"),
            json!({ "name": "faq.pdf" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], true);

        // Submitting from the first step is refused.
        let (status, _) = post(&client, format!("{base}/api/wizard/{id}/submit"), json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);

        edit(&client, &base, &id, "name", json!("Draft Bot")).await;
        let (status, body) = post(&client, format!("{base}/api/wizard/{id}/draft"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draft"]["form"]["name"], "Draft Bot");
        assert_eq!(body["draft"]["user_id"], "u-draft");

        let resp = client.delete(format!("{base}/api/wizard/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["state"]["status"], "cancelled");

        let resp = client.get(format!("{base}/api/wizard/{id}")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    })
    .await
    .expect("test timed out");
}
