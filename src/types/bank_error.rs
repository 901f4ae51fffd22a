use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BankError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("account not found")]
    AccountNotFound,
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error("account number {0} is already in use")]
    AccountNumberTaken(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("recipient is required")]
    RecipientRequired,
    #[error("unknown transaction kind: {0}")]
    UnknownTransactionKind(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for BankError {
    fn from(err: rusqlite::Error) -> Self {
        BankError::Storage(err.to_string())
    }
}
