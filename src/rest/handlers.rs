use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;

use crate::auth::{password, SESSION_COOKIE};
use crate::types::{parse_amount, Account, BankError, User, UserId};

use super::{
    models::{
        AccountResponse, ErrorResponse, FieldError, HealthResponse, LoginRequest,
        RegisterRequest, RegisterResponse, SessionResponse, TransactionRequest,
        TransactionResponse, TransactionResult, UserResponse,
    },
    AppState,
};

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let mut errors = Vec::new();
    let username = body.username.as_deref().unwrap_or("").trim().to_string();
    if username.len() < 3 {
        errors.push(field_error(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    let password_raw = body.password.as_deref().unwrap_or("");
    if password_raw.len() < 6 {
        errors.push(field_error(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    match body.confirm_password.as_deref() {
        None | Some("") => {
            errors.push(field_error("confirmPassword", "Please confirm your password"));
        }
        Some(confirm) if confirm != password_raw => {
            errors.push(field_error("confirmPassword", "Passwords do not match"));
        }
        Some(_) => {}
    }
    let name = body.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        errors.push(field_error("name", "Name is required"));
    }
    let email = body.email.as_deref().unwrap_or("").trim().to_string();
    if !looks_like_email(&email) {
        errors.push(field_error("email", "Invalid email address"));
    }
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    match state.storage.find_user_by_username(&username) {
        Ok(Some(_)) => return error_response(StatusCode::BAD_REQUEST, "Username already exists"),
        Ok(None) => {}
        Err(err) => return bank_error_response("registration", err),
    }
    match state.storage.find_user_by_email(&email) {
        Ok(Some(_)) => {
            return error_response(StatusCode::BAD_REQUEST, "Email already registered")
        }
        Ok(None) => {}
        Err(err) => return bank_error_response("registration", err),
    }

    let user = match state.storage.create_user(crate::storage::NewUser {
        username,
        password: password::hash(password_raw),
        name,
        email,
    }) {
        Ok(user) => user,
        Err(err) => return bank_error_response("registration", err),
    };

    let account = match state.ledger.open_account(
        user.id,
        &state.defaults.branch,
        &state.defaults.account_type,
        state.defaults.opening_balance,
    ) {
        Ok(account) => account,
        Err(err) => return bank_error_response("registration", err),
    };

    let token = state.sessions.create(user.id);
    log::info!("👤 Registered user {} (account {})", user.username, account.account_number);
    with_session_cookie(
        (
            StatusCode::CREATED,
            Json(RegisterResponse {
                token: token.clone(),
                user: UserResponse::from(&user),
                account: AccountResponse::from(&account),
            }),
        )
            .into_response(),
        &token,
    )
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let username = body.username.as_deref().unwrap_or("").trim();
    let candidate = body.password.as_deref().unwrap_or("");
    if username.is_empty() || candidate.is_empty() {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let user = match state.storage.find_user_by_username(username) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid username or password")
        }
        Err(err) => {
            log::error!("Failed to look up user {}: {:?}", username, err);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in");
        }
    };

    if !password::verify(candidate, &user.password) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let token = state.sessions.create(user.id);
    log::info!("🔓 User {} logged in", user.username);
    with_session_cookie(
        Json(SessionResponse {
            token: token.clone(),
            user: UserResponse::from(&user),
        })
        .into_response(),
        &token,
    )
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token);
    }
    let mut response = StatusCode::NO_CONTENT.into_response();
    let cleared = format!("{SESSION_COOKIE}=; Max-Age=0; HttpOnly; Path=/; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cleared) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match authenticated_user(&state, &headers) {
        Ok(user) => Json(UserResponse::from(&user)).into_response(),
        Err(response) => response,
    }
}

pub async fn get_account(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match authenticated_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match lookup_account(&state, user.id, "account") {
        Ok(account) => Json(AccountResponse::from(&account)).into_response(),
        Err(response) => response,
    }
}

pub async fn list_transactions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match authenticated_user(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let account = match lookup_account(&state, user.id, "transactions") {
        Ok(account) => account,
        Err(response) => return response,
    };
    match state.ledger.history(account.id) {
        Ok(history) => {
            let transactions: Vec<TransactionResponse> =
                history.iter().map(TransactionResponse::from).collect();
            Json(transactions).into_response()
        }
        Err(err) => {
            log::error!("Failed to list transactions for account {}: {:?}", account.id, err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch transactions",
            )
        }
    }
}

pub async fn deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TransactionRequest>,
) -> Response {
    let (account, amount) = match transaction_inputs(&state, &headers, &body, "deposit") {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };
    match state.ledger.deposit(account.id, amount, body.description) {
        Ok((transaction, account)) => created(transaction, account),
        Err(err) => bank_error_response("deposit", err),
    }
}

pub async fn withdraw(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TransactionRequest>,
) -> Response {
    let (account, amount) = match transaction_inputs(&state, &headers, &body, "withdrawal") {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };
    match state.ledger.withdraw(account.id, amount, body.description) {
        Ok((transaction, account)) => created(transaction, account),
        Err(err) => bank_error_response("withdrawal", err),
    }
}

pub async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TransactionRequest>,
) -> Response {
    let (account, amount) = match transaction_inputs(&state, &headers, &body, "transfer") {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };
    match state
        .ledger
        .transfer(account.id, amount, body.description, body.recipient)
    {
        Ok((transaction, account)) => created(transaction, account),
        Err(err) => bank_error_response("transfer", err),
    }
}

pub async fn payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TransactionRequest>,
) -> Response {
    let (account, amount) = match transaction_inputs(&state, &headers, &body, "payment") {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };
    match state
        .ledger
        .payment(account.id, amount, body.description, body.recipient)
    {
        Ok((transaction, account)) => created(transaction, account),
        Err(err) => bank_error_response("payment", err),
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
            errors: None,
        }),
    )
}

fn transaction_inputs(
    state: &AppState,
    headers: &HeaderMap,
    body: &TransactionRequest,
    operation: &str,
) -> Result<(Account, Decimal), Response> {
    let user = authenticated_user(state, headers)?;
    let account = lookup_account(state, user.id, operation)?;
    let amount = match body.amount.as_deref() {
        None => {
            return Err(validation_failed(vec![field_error(
                "amount",
                "Amount is required",
            )]))
        }
        Some(raw) => match parse_amount(raw) {
            Ok(amount) => amount,
            Err(BankError::InvalidAmount(message)) => {
                return Err(validation_failed(vec![field_error("amount", &message)]))
            }
            Err(err) => return Err(bank_error_response(operation, err)),
        },
    };
    Ok((account, amount))
}

fn authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<User, Response> {
    let Some(token) = session_token(headers) else {
        return Err(unauthorized());
    };
    let Some(user_id) = state.sessions.resolve(&token) else {
        return Err(unauthorized());
    };
    match state.storage.load_user(user_id) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(unauthorized()),
        Err(err) => {
            log::error!("Failed to load user {}: {:?}", user_id, err);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load user",
            ))
        }
    }
}

fn lookup_account(
    state: &AppState,
    user_id: UserId,
    operation: &str,
) -> Result<Account, Response> {
    match state.ledger.account_for_user(user_id) {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(error_response(StatusCode::NOT_FOUND, "Account not found")),
        Err(err) => {
            log::error!("Failed to load account for user {}: {:?}", user_id, err);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to process {operation}"),
            ))
        }
    }
}

/// Pick the session token out of `Authorization: Bearer` or the session cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(s) = value.to_str() {
            if let Some(token) = s.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    if let Some(value) = headers.get(header::COOKIE) {
        if let Ok(s) = value.to_str() {
            for pair in s.split(';') {
                if let Some((name, token)) = pair.trim().split_once('=') {
                    if name == SESSION_COOKIE {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }
    None
}

fn with_session_cookie(mut response: Response, token: &str) -> Response {
    let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn created(transaction: crate::types::Transaction, account: Account) -> Response {
    (
        StatusCode::CREATED,
        Json(TransactionResult {
            transaction: TransactionResponse::from(&transaction),
            account: AccountResponse::from(&account),
        }),
    )
        .into_response()
}

fn field_error(field: &str, message: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn validation_failed(errors: Vec<FieldError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: "Invalid input".to_string(),
            errors: Some(errors),
        }),
    )
        .into_response()
}

fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Unauthorized")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
            errors: None,
        }),
    )
        .into_response()
}

fn bank_error_response(operation: &str, err: BankError) -> Response {
    match err {
        BankError::InsufficientFunds { .. } => {
            error_response(StatusCode::BAD_REQUEST, "Insufficient funds")
        }
        BankError::AccountNotFound => error_response(StatusCode::NOT_FOUND, "Account not found"),
        BankError::UsernameTaken(_) => {
            error_response(StatusCode::BAD_REQUEST, "Username already exists")
        }
        BankError::EmailTaken(_) => {
            error_response(StatusCode::BAD_REQUEST, "Email already registered")
        }
        BankError::RecipientRequired => error_response(
            StatusCode::BAD_REQUEST,
            "Recipient is required for transfers",
        ),
        BankError::InvalidAmount(message) => {
            validation_failed(vec![field_error("amount", &message)])
        }
        err => {
            log::error!("Failed to process {}: {:?}", operation, err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to process {operation}"),
            )
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::SessionStore;
    use crate::ledger::Ledger;
    use crate::rest::{router, AccountDefaults};
    use crate::storage::MemoryStorage;

    fn test_state() -> AppState {
        let storage = Arc::new(MemoryStorage::new());
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

    async fn register_demo(state: &AppState) -> String {
        let (status, body) = send(
            state,
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "maria",
                "password": "s3nh4-segura",
                "confirmPassword": "s3nh4-segura",
                "name": "Maria Silva",
                "email": "maria@example.com",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = test_state();
        let (status, body) = send(&state, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_endpoint_is_404() {
        let state = test_state();
        let (status, body) = send(&state, "GET", "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "endpoint not found");
    }

    #[tokio::test]
    async fn protected_endpoints_require_a_session() {
        let state = test_state();
        for uri in ["/api/user", "/api/account", "/api/transactions"] {
            let (status, body) = send(&state, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["message"], "Unauthorized");
        }
        let (status, _) = send(
            &state,
            "POST",
            "/api/transactions/deposit",
            None,
            Some(json!({"amount": "10.00"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let state = test_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "ab",
                "password": "short",
                "name": "",
                "email": "not-an-email",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid input");
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"confirmPassword"));
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"email"));
    }

    #[tokio::test]
    async fn register_rejects_password_mismatch() {
        let state = test_state();
        let (status, body) = send(
            &state,
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "maria",
                "password": "s3nh4-segura",
                "confirmPassword": "different",
                "name": "Maria Silva",
                "email": "maria@example.com",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = body["errors"].as_array().unwrap();
        assert!(errors
            .iter()
            .any(|e| e["field"] == "confirmPassword" && e["message"] == "Passwords do not match"));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_400() {
        let state = test_state();
        register_demo(&state).await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "maria",
                "password": "s3nh4-segura",
                "confirmPassword": "s3nh4-segura",
                "name": "Other Maria",
                "email": "other@example.com",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Username already exists");
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let state = test_state();
        register_demo(&state).await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/login",
            None,
            Some(json!({"username": "maria", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid username or password");

        let (status, _) = send(
            &state,
            "POST",
            "/api/login",
            None,
            Some(json!({"username": "nobody", "password": "whatever"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deposit_returns_transaction_and_updated_account() {
        let state = test_state();
        let token = register_demo(&state).await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/transactions/deposit",
            Some(&token),
            Some(json!({"amount": "150.75"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["transaction"]["type"], "deposit");
        assert_eq!(body["transaction"]["amount"], "150.75");
        assert_eq!(body["transaction"]["description"], "Deposit");
        assert_eq!(body["account"]["balance"], "150.75");
    }

    #[tokio::test]
    async fn withdrawal_rejects_overdraft() {
        let state = test_state();
        let token = register_demo(&state).await;
        send(
            &state,
            "POST",
            "/api/transactions/deposit",
            Some(&token),
            Some(json!({"amount": "50.00"})),
        )
        .await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/transactions/withdraw",
            Some(&token),
            Some(json!({"amount": "50.01"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Insufficient funds");
    }

    #[tokio::test]
    async fn invalid_amounts_surface_as_field_errors() {
        let state = test_state();
        let token = register_demo(&state).await;
        for amount in [json!({}), json!({"amount": ""}), json!({"amount": "-1"})] {
            let (status, body) = send(
                &state,
                "POST",
                "/api/transactions/deposit",
                Some(&token),
                Some(amount),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["errors"][0]["field"], "amount");
        }
    }

    #[tokio::test]
    async fn transfer_without_recipient_is_rejected() {
        let state = test_state();
        let token = register_demo(&state).await;
        send(
            &state,
            "POST",
            "/api/transactions/deposit",
            Some(&token),
            Some(json!({"amount": "100.00"})),
        )
        .await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/transactions/transfer",
            Some(&token),
            Some(json!({"amount": "10.00"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Recipient is required for transfers");
    }

    #[tokio::test]
    async fn payment_defaults_recipient() {
        let state = test_state();
        let token = register_demo(&state).await;
        send(
            &state,
            "POST",
            "/api/transactions/deposit",
            Some(&token),
            Some(json!({"amount": "100.00"})),
        )
        .await;
        let (status, body) = send(
            &state,
            "POST",
            "/api/transactions/payment",
            Some(&token),
            Some(json!({"amount": "30.00", "description": "Conta de luz"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["transaction"]["recipient"], "Unknown recipient");
        assert_eq!(body["transaction"]["description"], "Conta de luz");
        assert_eq!(body["account"]["balance"], "70.00");
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let state = test_state();
        let token = register_demo(&state).await;
        let (status, _) = send(&state, "POST", "/api/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, "GET", "/api/account", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_authenticates_too() {
        let state = test_state();
        let token = register_demo(&state).await;
        let request = Request::builder()
            .method("GET")
            .uri("/api/account")
            .header("cookie", format!("{SESSION_COOKIE}={token}; theme=dark"))
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
