use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;

use crate::auth::SessionStore;
use crate::ledger::Ledger;
use crate::storage::Storage;

mod handlers;
mod models;

use handlers::{
    current_user, deposit, get_account, health, list_transactions, login, logout, not_found,
    payment, register, transfer, withdraw,
};

/// Defaults applied to accounts opened through registration.
#[derive(Clone)]
pub struct AccountDefaults {
    pub branch: String,
    pub account_type: String,
    pub opening_balance: Decimal,
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage + Send + Sync>,
    pub ledger: Ledger,
    pub sessions: SessionStore,
    pub defaults: AccountDefaults,
    pub started_at: std::time::SystemTime,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(current_user))
        .route("/api/account", get(get_account))
        .route("/api/transactions", get(list_transactions))
        .route("/api/transactions/deposit", post(deposit))
        .route("/api/transactions/withdraw", post(withdraw))
        .route("/api/transactions/transfer", post(transfer))
        .route("/api/transactions/payment", post(payment))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
