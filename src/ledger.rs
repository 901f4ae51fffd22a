use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;

use crate::storage::{LedgerEntry, NewAccount, Storage};
use crate::types::{Account, AccountId, BankError, Transaction, TransactionKind, UserId};

const ACCOUNT_NUMBER_ATTEMPTS: usize = 16;

/// Balance operations over a storage backend. Storage guarantees the
/// record-and-update step is atomic; this layer owns the business rules
/// around it (descriptions, recipients, account opening).
#[derive(Clone)]
pub struct Ledger {
    storage: Arc<dyn Storage + Send + Sync>,
}

impl Ledger {
    pub fn new(storage: Arc<dyn Storage + Send + Sync>) -> Self {
        Self { storage }
    }

    pub fn account_for_user(&self, user_id: UserId) -> Result<Option<Account>, BankError> {
        self.storage.find_account_by_user(user_id)
    }

    /// Open an account with a freshly generated unique account number.
    pub fn open_account(
        &self,
        user_id: UserId,
        branch: &str,
        account_type: &str,
        balance: Decimal,
    ) -> Result<Account, BankError> {
        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let account_number = generate_account_number();
            if self
                .storage
                .find_account_by_number(&account_number)?
                .is_some()
            {
                continue;
            }
            match self.storage.create_account(NewAccount {
                user_id,
                account_number,
                branch: branch.to_string(),
                account_type: account_type.to_string(),
                balance,
            }) {
                Err(BankError::AccountNumberTaken(_)) => continue,
                other => return other,
            }
        }
        Err(BankError::Storage(
            "could not allocate a unique account number".to_string(),
        ))
    }

    pub fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<(Transaction, Account), BankError> {
        self.apply(account_id, TransactionKind::Deposit, amount, description, None)
    }

    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<(Transaction, Account), BankError> {
        self.apply(
            account_id,
            TransactionKind::Withdrawal,
            amount,
            description,
            None,
        )
    }

    /// Transfers debit this account only; the recipient is a free-form
    /// label, not a second account.
    pub fn transfer(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: Option<String>,
        recipient: Option<String>,
    ) -> Result<(Transaction, Account), BankError> {
        let recipient = non_empty(recipient).ok_or(BankError::RecipientRequired)?;
        self.apply(
            account_id,
            TransactionKind::Transfer,
            amount,
            description,
            Some(recipient),
        )
    }

    pub fn payment(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: Option<String>,
        recipient: Option<String>,
    ) -> Result<(Transaction, Account), BankError> {
        let recipient =
            non_empty(recipient).unwrap_or_else(|| "Unknown recipient".to_string());
        self.apply(
            account_id,
            TransactionKind::Payment,
            amount,
            description,
            Some(recipient),
        )
    }

    pub fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, BankError> {
        self.storage.list_transactions(account_id)
    }

    fn apply(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Decimal,
        description: Option<String>,
        recipient: Option<String>,
    ) -> Result<(Transaction, Account), BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }
        let description =
            non_empty(description).unwrap_or_else(|| kind.default_description().to_string());
        self.storage.apply_transaction(
            account_id,
            LedgerEntry {
                kind,
                amount,
                description: Some(description),
                recipient,
            },
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn generate_account_number() -> String {
    format!("{:08}", rand::thread_rng().gen_range(0..100_000_000u32))
}
