mod account;
mod bank_error;
mod money;
mod transaction;
mod user;

pub use account::{Account, AccountId};
pub use bank_error::BankError;
pub use money::{format_amount, parse_amount, parse_balance};
pub use transaction::{Direction, Transaction, TransactionId, TransactionKind};
pub use user::{User, UserId};
