use rust_decimal::Decimal;

use crate::types::{Account, AccountId, BankError, Transaction, TransactionKind, User, UserId};

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    /// Already run through `auth::password::hash`.
    pub password: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub user_id: UserId,
    pub account_number: String,
    pub branch: String,
    pub account_type: String,
    pub balance: Decimal,
}

/// A balance-affecting event, recorded together with its balance effect.
#[derive(Clone, Debug)]
pub struct LedgerEntry {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub recipient: Option<String>,
}

pub trait Storage {
    fn create_user(&self, new: NewUser) -> Result<User, BankError>;
    fn load_user(&self, id: UserId) -> Result<Option<User>, BankError>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, BankError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BankError>;

    fn create_account(&self, new: NewAccount) -> Result<Account, BankError>;
    fn load_account(&self, id: AccountId) -> Result<Option<Account>, BankError>;
    fn find_account_by_user(&self, user_id: UserId) -> Result<Option<Account>, BankError>;
    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, BankError>;

    /// Record `entry` against the account and apply its balance effect as a
    /// single atomic step. Debits that exceed the balance fail with
    /// `InsufficientFunds` and leave nothing behind.
    fn apply_transaction(
        &self,
        account_id: AccountId,
        entry: LedgerEntry,
    ) -> Result<(Transaction, Account), BankError>;

    /// History for an account, newest first.
    fn list_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, BankError>;
}
