use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::SessionStore;
use crate::ledger::Ledger;
use crate::rest::{router, AccountDefaults, AppState};
use crate::storage::{MemoryStorage, SqliteStorage, Storage};

fn state_with(storage: Arc<dyn Storage + Send + Sync>) -> AppState {
    AppState {
        storage: storage.clone(),
        ledger: Ledger::new(storage),
        sessions: SessionStore::new(Duration::from_secs(60)),
        defaults: AccountDefaults {
            branch: "0001".to_string(),
            account_type: "Corrente".to_string(),
            opening_balance: Decimal::ZERO,
        },
        started_at: SystemTime::now(),
    }
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(state: &AppState, username: &str, email: &str) -> (String, Value) {
    let (status, body) = send(
        state,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "username": username,
            "password": "s3nh4-segura",
            "confirmPassword": "s3nh4-segura",
            "name": "Maria Silva",
            "email": email,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let token = body["token"].as_str().unwrap().to_string();
    (token, body)
}

#[tokio::test]
async fn full_banking_journey_in_memory() {
    let state = state_with(Arc::new(MemoryStorage::new()));
    let (token, registered) = register(&state, "maria", "maria@example.com").await;

    // Registration opened the account with the configured defaults.
    let account = &registered["account"];
    assert_eq!(account["branch"], "0001");
    assert_eq!(account["type"], "Corrente");
    assert_eq!(account["balance"], "0.00");
    let number = account["accountNumber"].as_str().unwrap();
    assert_eq!(number.len(), 8);
    assert!(number.chars().all(|c| c.is_ascii_digit()));

    let (status, _) = send(
        &state,
        "POST",
        "/api/transactions/deposit",
        Some(&token),
        Some(json!({"amount": "1000.00", "description": "Salário"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &state,
        "POST",
        "/api/transactions/withdraw",
        Some(&token),
        Some(json!({"amount": "150.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &state,
        "POST",
        "/api/transactions/transfer",
        Some(&token),
        Some(json!({"amount": "99.90", "recipient": "joao"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["transaction"]["recipient"], "joao");

    let (status, _) = send(
        &state,
        "POST",
        "/api/transactions/payment",
        Some(&token),
        Some(json!({"amount": "50.10", "recipient": "Companhia de Luz"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&state, "GET", "/api/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "700.00");

    let (status, body) = send(&state, "GET", "/api/transactions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["payment", "transfer", "withdrawal", "deposit"]);

    let (status, body) = send(&state, "GET", "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "maria");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn accounts_are_isolated_between_users() {
    let state = state_with(Arc::new(MemoryStorage::new()));
    let (maria, _) = register(&state, "maria", "maria@example.com").await;
    let (joao, _) = register(&state, "joao", "joao@example.com").await;

    send(
        &state,
        "POST",
        "/api/transactions/deposit",
        Some(&maria),
        Some(json!({"amount": "500.00"})),
    )
    .await;

    let (_, body) = send(&state, "GET", "/api/account", Some(&joao), None).await;
    assert_eq!(body["balance"], "0.00");
    let (_, body) = send(&state, "GET", "/api/transactions", Some(&joao), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_backend_persists_across_restart() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("cryptobank.sqlite");

    {
        let storage = SqliteStorage::new(&db_path.to_string_lossy());
        storage.init().expect("init schema");
        let state = state_with(Arc::new(storage));
        let (token, _) = register(&state, "maria", "maria@example.com").await;
        let (status, _) = send(
            &state,
            "POST",
            "/api/transactions/deposit",
            Some(&token),
            Some(json!({"amount": "250.00"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Fresh state over the same database: sessions are gone, data is not.
    let storage = SqliteStorage::new(&db_path.to_string_lossy());
    storage.init().expect("re-init schema");
    let state = state_with(Arc::new(storage));

    let (status, body) = send(
        &state,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": "maria", "password": "s3nh4-segura"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["token"].as_str().unwrap().to_string();

    let (_, body) = send(&state, "GET", "/api/account", Some(&token), None).await;
    assert_eq!(body["balance"], "250.00");
    let (_, body) = send(&state, "GET", "/api/transactions", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["amount"], "250.00");
}
