use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context as AnyhowContext, Result};

use crate::auth::SessionStore;
use crate::context;
use crate::ledger::Ledger;
use crate::rest::{AccountDefaults, AppState};
use crate::storage::{self, Storage};

pub fn init_storage(ctx: &context::Context) -> Result<Arc<dyn Storage + Send + Sync>> {
    match ctx.config.db.as_deref() {
        Some(path) => {
            let sqlite = storage::SqliteStorage::new(path);
            if ctx.config.reset {
                sqlite.reset_all().context("resetting storage")?;
            }
            sqlite.init().context("initializing storage")?;
            Ok(Arc::new(sqlite))
        }
        None => Ok(Arc::new(storage::MemoryStorage::new())),
    }
}

pub fn build_state(ctx: &context::Context, storage: Arc<dyn Storage + Send + Sync>) -> AppState {
    AppState {
        storage: storage.clone(),
        ledger: Ledger::new(storage),
        sessions: SessionStore::new(ctx.config.session_ttl),
        defaults: AccountDefaults {
            branch: ctx.config.branch.clone(),
            account_type: ctx.config.account_type.clone(),
            opening_balance: ctx.config.opening_balance,
        },
        started_at: SystemTime::now(),
    }
}
