use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::UserId;

pub type AccountId = i64;

/// A balance-holding record owned by exactly one user.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub account_number: String,
    pub branch: String,
    pub account_type: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}
