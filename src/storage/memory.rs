use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::traits::{LedgerEntry, NewAccount, NewUser, Storage};
use crate::types::{
    Account, AccountId, BankError, Direction, Transaction, TransactionId, User, UserId,
};

/// Map-backed storage with auto-incrementing ids. The whole store sits behind
/// one mutex, so `apply_transaction` is atomic by construction.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    users: HashMap<UserId, User>,
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
    next_user_id: UserId,
    next_account_id: AccountId,
    next_transaction_id: TransactionId,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                users: HashMap::new(),
                accounts: HashMap::new(),
                transactions: HashMap::new(),
                next_user_id: 1,
                next_account_id: 1,
                next_transaction_id: 1,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, BankError> {
        self.inner
            .lock()
            .map_err(|_| BankError::Storage("memory storage mutex poisoned".to_string()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn create_user(&self, new: NewUser) -> Result<User, BankError> {
        let mut inner = self.lock()?;
        if inner.users.values().any(|u| u.username == new.username) {
            return Err(BankError::UsernameTaken(new.username));
        }
        if inner.users.values().any(|u| u.email == new.email) {
            return Err(BankError::EmailTaken(new.email));
        }
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let user = User {
            id,
            username: new.username,
            password: new.password,
            name: new.name,
            email: new.email,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    fn load_user(&self, id: UserId) -> Result<Option<User>, BankError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, BankError> {
        let inner = self.lock()?;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BankError> {
        let inner = self.lock()?;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    fn create_account(&self, new: NewAccount) -> Result<Account, BankError> {
        let mut inner = self.lock()?;
        if inner
            .accounts
            .values()
            .any(|a| a.account_number == new.account_number)
        {
            return Err(BankError::AccountNumberTaken(new.account_number));
        }
        let id = inner.next_account_id;
        inner.next_account_id += 1;
        let account = Account {
            id,
            user_id: new.user_id,
            account_number: new.account_number,
            branch: new.branch,
            account_type: new.account_type,
            balance: new.balance,
            created_at: Utc::now(),
        };
        inner.accounts.insert(id, account.clone());
        Ok(account)
    }

    fn load_account(&self, id: AccountId) -> Result<Option<Account>, BankError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    fn find_account_by_user(&self, user_id: UserId) -> Result<Option<Account>, BankError> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, BankError> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .values()
            .find(|a| a.account_number == number)
            .cloned())
    }

    fn apply_transaction(
        &self,
        account_id: AccountId,
        entry: LedgerEntry,
    ) -> Result<(Transaction, Account), BankError> {
        let mut inner = self.lock()?;
        let balance = inner
            .accounts
            .get(&account_id)
            .ok_or(BankError::AccountNotFound)?
            .balance;

        let new_balance = match entry.kind.direction() {
            Direction::Credit => balance + entry.amount,
            Direction::Debit => {
                if balance < entry.amount {
                    return Err(BankError::InsufficientFunds {
                        balance,
                        requested: entry.amount,
                    });
                }
                balance - entry.amount
            }
        };

        let id = inner.next_transaction_id;
        inner.next_transaction_id += 1;
        let transaction = Transaction {
            id,
            account_id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            recipient: entry.recipient,
            created_at: Utc::now(),
        };
        inner.transactions.insert(id, transaction.clone());

        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or(BankError::AccountNotFound)?;
        account.balance = new_balance;
        let account = account.clone();

        Ok((transaction, account))
    }

    fn list_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, BankError> {
        let inner = self.lock()?;
        let mut history: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(history)
    }
}
