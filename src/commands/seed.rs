use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{bail, Context as AnyhowContext, Result};

use crate::auth::password;
use crate::cli::SeedCmd;
use crate::context::Context;
use crate::ledger::Ledger;
use crate::storage::{NewUser, Storage};
use crate::types::{format_amount, parse_balance};

pub fn run(ctx: &Context, storage: Arc<dyn Storage + Send + Sync>, args: &SeedCmd) -> Result<()> {
    if ctx.config.db.is_none() {
        bail!("seed requires --db; an in-memory store would vanish with the process");
    }

    let balance = parse_balance(&args.balance).context("parsing --balance")?;
    let raw_password = match &args.password {
        Some(password) => password.clone(),
        None => prompt_password()?,
    };
    if raw_password.len() < 6 {
        bail!("password must be at least 6 characters");
    }

    let user = storage.create_user(NewUser {
        username: args.username.clone(),
        password: password::hash(&raw_password),
        name: args.name.clone(),
        email: args.email.clone(),
    })?;

    let ledger = Ledger::new(storage);
    let account = ledger.open_account(
        user.id,
        &ctx.config.branch,
        &ctx.config.account_type,
        balance,
    )?;

    log::info!(
        "👤 Seeded user {} with account {} (balance {})",
        user.username,
        account.account_number,
        format_amount(account.balance)
    );
    Ok(())
}

/// Double-entry password prompt, used when --password is not given.
fn prompt_password() -> Result<String> {
    if !std::io::stdin().is_terminal() {
        bail!("no --password given and stdin is not a terminal");
    }
    let first = rpassword::prompt_password("Enter password: ").context("read password")?;
    let second = rpassword::prompt_password("Confirm password: ").context("confirm password")?;
    if first != second {
        bail!("passwords do not match");
    }
    Ok(first)
}
