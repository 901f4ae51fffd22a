use clap::Parser;
use std::env;

use crate::cli::command::Command;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Demo banking REST service with session authentication",
    long_about = "A small banking demo: users, one account each, and a transaction ledger \
                  served over a REST API. State lives in memory by default or in SQLite \
                  when --db is given.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long = "listen",
        env = "CRYPTOBANK_LISTEN",
        default_value = "127.0.0.1:8080",
        value_name = "ADDR",
        help = "REST API listen address (host:port)"
    )]
    pub listen: std::net::SocketAddr,

    #[arg(
        long = "db",
        env = "CRYPTOBANK_DB",
        value_name = "PATH",
        help = "SQLite database path; omit to keep all state in memory"
    )]
    pub db: Option<String>,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (drop the SQLite tables) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "CRYPTOBANK_BRANCH",
        default_value = "0001",
        value_name = "BRANCH",
        help = "Branch code stamped on newly opened accounts"
    )]
    pub branch: String,

    #[arg(
        long = "account-type",
        env = "CRYPTOBANK_ACCOUNT_TYPE",
        default_value = "Corrente",
        value_name = "TYPE",
        help = "Account type for newly opened accounts"
    )]
    pub account_type: String,

    #[arg(
        long = "opening-balance",
        env = "CRYPTOBANK_OPENING_BALANCE",
        default_value = "0",
        value_name = "AMOUNT",
        help = "Balance granted to newly registered accounts"
    )]
    pub opening_balance: String,

    #[arg(
        long = "session-ttl",
        env = "CRYPTOBANK_SESSION_TTL",
        default_value_t = 1800u64,
        value_name = "SECS",
        help = "Seconds before a session token expires"
    )]
    pub session_ttl: u64,

    #[arg(
        long = "log-file",
        env = "CRYPTOBANK_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}
