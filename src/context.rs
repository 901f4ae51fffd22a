use std::time::Duration;

use anyhow::{Context as AnyhowContext, Result};

use crate::configuration::Configuration;
use crate::types::parse_balance;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let opening_balance =
            parse_balance(&cli.opening_balance).context("parsing --opening-balance")?;
        Ok(Self {
            config: Configuration {
                listen: cli.listen,
                db: cli.db.clone(),
                reset: cli.reset,
                branch: cli.branch.clone(),
                account_type: cli.account_type.clone(),
                opening_balance,
                session_ttl: Duration::from_secs(cli.session_ttl),
                log_file: cli.log_file.clone(),
            },
        })
    }
}
