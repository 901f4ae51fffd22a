use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::{params, types::Type, Connection, OptionalExtension, TransactionBehavior};
use std::str::FromStr;

use super::traits::{LedgerEntry, NewAccount, NewUser, Storage};
use crate::types::{
    format_amount, Account, AccountId, BankError, Direction, Transaction, TransactionKind, User,
    UserId,
};

const DB_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    account_number TEXT NOT NULL UNIQUE,
    branch TEXT NOT NULL,
    account_type TEXT NOT NULL,
    balance TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    kind TEXT NOT NULL,
    amount TEXT NOT NULL,
    description TEXT,
    recipient TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
";

/// SQLite-backed storage. Connections are opened per call; the atomic
/// record-and-update step runs inside a BEGIN IMMEDIATE transaction.
#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

impl SqliteStorage {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    fn open(&self) -> Result<Connection, BankError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    pub fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(SCHEMA_SQL)?;
        let version: Option<i64> = conn
            .query_row("SELECT version FROM schema_meta WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        match version {
            None => {
                conn.execute(
                    "INSERT INTO schema_meta (id, version) VALUES (1, ?1)",
                    params![DB_SCHEMA_VERSION],
                )?;
            }
            Some(v) if v == DB_SCHEMA_VERSION => {}
            Some(v) => anyhow::bail!("unsupported database schema version {v}"),
        }
        Ok(())
    }

    pub fn reset_all(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            "DROP TABLE IF EXISTS transactions;
             DROP TABLE IF EXISTS accounts;
             DROP TABLE IF EXISTS users;
             DROP TABLE IF EXISTS schema_meta;",
        )?;
        Ok(())
    }
}

fn parse_timestamp(column: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}

fn parse_money(column: usize, raw: String) -> rusqlite::Result<Decimal> {
    Decimal::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err)))
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        created_at: parse_timestamp(5, row.get(5)?)?,
    })
}

fn map_account_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_number: row.get(2)?,
        branch: row.get(3)?,
        account_type: row.get(4)?,
        balance: parse_money(5, row.get(5)?)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
    })
}

fn map_transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_raw: String = row.get(2)?;
    let kind = TransactionKind::from_str(&kind_raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?;
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        kind,
        amount: parse_money(3, row.get(3)?)?,
        description: row.get(4)?,
        recipient: row.get(5)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
    })
}

fn db_load_user(conn: &Connection, id: UserId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, password, name, email, created_at FROM users WHERE id = ?1",
        params![id],
        map_user_row,
    )
    .optional()
}

fn db_find_user(conn: &Connection, column: &str, value: &str) -> rusqlite::Result<Option<User>> {
    let sql = format!(
        "SELECT id, username, password, name, email, created_at FROM users WHERE {column} = ?1"
    );
    conn.query_row(&sql, params![value], map_user_row).optional()
}

const ACCOUNT_COLUMNS: &str =
    "id, user_id, account_number, branch, account_type, balance, created_at";

fn db_load_account(conn: &Connection, id: AccountId) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
        params![id],
        map_account_row,
    )
    .optional()
}

impl Storage for SqliteStorage {
    fn create_user(&self, new: NewUser) -> Result<User, BankError> {
        let conn = self.open()?;
        if db_find_user(&conn, "username", &new.username)?.is_some() {
            return Err(BankError::UsernameTaken(new.username));
        }
        if db_find_user(&conn, "email", &new.email)?.is_some() {
            return Err(BankError::EmailTaken(new.email));
        }
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO users (username, password, name, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.username,
                new.password,
                new.name,
                new.email,
                created_at.to_rfc3339()
            ],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            username: new.username,
            password: new.password,
            name: new.name,
            email: new.email,
            created_at,
        })
    }

    fn load_user(&self, id: UserId) -> Result<Option<User>, BankError> {
        Ok(db_load_user(&self.open()?, id)?)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, BankError> {
        Ok(db_find_user(&self.open()?, "username", username)?)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BankError> {
        Ok(db_find_user(&self.open()?, "email", email)?)
    }

    fn create_account(&self, new: NewAccount) -> Result<Account, BankError> {
        let conn = self.open()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM accounts WHERE account_number = ?1",
                params![new.account_number],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(BankError::AccountNumberTaken(new.account_number));
        }
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO accounts (user_id, account_number, branch, account_type, balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.user_id,
                new.account_number,
                new.branch,
                new.account_type,
                format_amount(new.balance),
                created_at.to_rfc3339()
            ],
        )?;
        Ok(Account {
            id: conn.last_insert_rowid(),
            user_id: new.user_id,
            account_number: new.account_number,
            branch: new.branch,
            account_type: new.account_type,
            balance: new.balance,
            created_at,
        })
    }

    fn load_account(&self, id: AccountId) -> Result<Option<Account>, BankError> {
        Ok(db_load_account(&self.open()?, id)?)
    }

    fn find_account_by_user(&self, user_id: UserId) -> Result<Option<Account>, BankError> {
        let conn = self.open()?;
        Ok(conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ?1"),
                params![user_id],
                map_account_row,
            )
            .optional()?)
    }

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, BankError> {
        let conn = self.open()?;
        Ok(conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = ?1"),
                params![number],
                map_account_row,
            )
            .optional()?)
    }

    fn apply_transaction(
        &self,
        account_id: AccountId,
        entry: LedgerEntry,
    ) -> Result<(Transaction, Account), BankError> {
        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut account = db_load_account(&tx, account_id)?.ok_or(BankError::AccountNotFound)?;
        let new_balance = match entry.kind.direction() {
            Direction::Credit => account.balance + entry.amount,
            Direction::Debit => {
                if account.balance < entry.amount {
                    return Err(BankError::InsufficientFunds {
                        balance: account.balance,
                        requested: entry.amount,
                    });
                }
                account.balance - entry.amount
            }
        };

        tx.execute(
            "UPDATE accounts SET balance = ?1 WHERE id = ?2",
            params![format_amount(new_balance), account_id],
        )?;

        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO transactions (account_id, kind, amount, description, recipient, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account_id,
                entry.kind.as_str(),
                format_amount(entry.amount),
                entry.description,
                entry.recipient,
                created_at.to_rfc3339()
            ],
        )?;
        let transaction_id = tx.last_insert_rowid();
        tx.commit()?;

        account.balance = new_balance;
        Ok((
            Transaction {
                id: transaction_id,
                account_id,
                kind: entry.kind,
                amount: entry.amount,
                description: entry.description,
                recipient: entry.recipient,
                created_at,
            },
            account,
        ))
    }

    fn list_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>, BankError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, account_id, kind, amount, description, recipient, created_at
             FROM transactions WHERE account_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let mapped = stmt
            .query_map(params![account_id], map_transaction_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(mapped)
    }
}
