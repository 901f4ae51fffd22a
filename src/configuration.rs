use std::net::SocketAddr;
use std::time::Duration;

use rust_decimal::Decimal;

#[derive(Clone)]
pub struct Configuration {
    pub listen: SocketAddr,
    pub db: Option<String>,
    pub reset: bool,
    pub branch: String,
    pub account_type: String,
    pub opening_balance: Decimal,
    pub session_ttl: Duration,
    pub log_file: Option<String>,
}
