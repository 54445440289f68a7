//! PostgreSQL-backed ledger store
//!
//! Persists balances and both ledgers in PostgreSQL. A unit of work is a
//! `sqlx::Transaction`; row locks are `SELECT ... FOR UPDATE` taken in
//! username order, so they are held until the transaction ends. Dropping an
//! uncommitted transaction rolls it back.
//!
//! ## Error Mapping
//!
//! | Situation | LedgerError |
//! |-----------|-------------|
//! | `INSERT ... ON CONFLICT DO NOTHING` inserted no row | `UsernameExists` |
//! | Conditional debit updated no row | `InsufficientBalance` |
//! | Any other sqlx error | `StorageFailure` |

use crate::core::traits::{LedgerStore, UnitOfWork};
use crate::types::{
    Account, Coins, LedgerError, LedgerResult, PurchaseRecord, TransferRecord, Username,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    username   TEXT PRIMARY KEY,
    balance    BIGINT NOT NULL CHECK (balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS purchases (
    id          BIGSERIAL PRIMARY KEY,
    username    TEXT NOT NULL REFERENCES accounts(username),
    item        TEXT NOT NULL,
    quantity    BIGINT NOT NULL CHECK (quantity > 0),
    unit_price  BIGINT NOT NULL,
    total_price BIGINT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS transfers (
    id         BIGSERIAL PRIMARY KEY,
    sender     TEXT NOT NULL REFERENCES accounts(username),
    receiver   TEXT NOT NULL REFERENCES accounts(username),
    amount     BIGINT NOT NULL CHECK (amount > 0),
    created_at TIMESTAMPTZ NOT NULL,
    CHECK (sender <> receiver)
);

CREATE INDEX IF NOT EXISTS idx_purchases_username ON purchases(username);
CREATE INDEX IF NOT EXISTS idx_transfers_sender ON transfers(sender);
CREATE INDEX IF NOT EXISTS idx_transfers_receiver ON transfers(receiver);
"#;

/// Ledger store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with a small pool
    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the tables and indexes if they don't exist yet
    pub async fn init_schema(&self) -> LedgerResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    type Unit = PostgresUnit;

    async fn begin(&self) -> LedgerResult<PostgresUnit> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnit { tx })
    }

    async fn balance(&self, account: &str) -> LedgerResult<Coins> {
        sqlx::query_scalar::<_, i64>("SELECT balance FROM accounts WHERE username = $1")
            .bind(account)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(account))
    }

    async fn purchases_of(&self, account: &str) -> LedgerResult<Vec<PurchaseRecord>> {
        let rows = sqlx::query_as::<_, (String, String, i64, i64, i64, DateTime<Utc>)>(
            r#"
            SELECT username, item, quantity, unit_price, total_price, created_at
            FROM purchases
            WHERE username = $1
            ORDER BY id ASC
            "#,
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(account, item, quantity, unit_price, total_price, created_at)| PurchaseRecord {
                    account,
                    item,
                    quantity,
                    unit_price,
                    total_price,
                    created_at,
                },
            )
            .collect())
    }

    async fn transfers_of(&self, account: &str) -> LedgerResult<Vec<TransferRecord>> {
        let rows = sqlx::query_as::<_, (String, String, i64, DateTime<Utc>)>(
            r#"
            SELECT sender, receiver, amount, created_at
            FROM transfers
            WHERE sender = $1 OR receiver = $1
            ORDER BY id ASC
            "#,
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(sender, receiver, amount, created_at)| TransferRecord {
                sender,
                receiver,
                amount,
                created_at,
            })
            .collect())
    }

    async fn accounts(&self) -> LedgerResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, (Username, i64)>("SELECT username, balance FROM accounts")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(username, coins)| Account::new(username, coins))
            .collect())
    }
}

/// Unit of work over one PostgreSQL transaction
pub struct PostgresUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnit {
    async fn lock_accounts(&mut self, accounts: &[&str]) -> LedgerResult<Vec<Username>> {
        let names: Vec<String> = accounts.iter().map(|name| name.to_string()).collect();
        let held = sqlx::query_scalar::<_, String>(
            "SELECT username FROM accounts WHERE username = ANY($1) ORDER BY username FOR UPDATE",
        )
        .bind(names)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(held)
    }

    async fn get_balance(&mut self, account: &str) -> LedgerResult<Coins> {
        sqlx::query_scalar::<_, i64>("SELECT balance FROM accounts WHERE username = $1 FOR UPDATE")
            .bind(account)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(account))
    }

    async fn account_exists(&mut self, account: &str) -> LedgerResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)",
        )
        .bind(account)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn credit(&mut self, account: &str, amount: Coins) -> LedgerResult<()> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }
        let balance = self.get_balance(account).await?;
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", account))?;

        sqlx::query("UPDATE accounts SET balance = $2 WHERE username = $1")
            .bind(account)
            .bind(updated)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn debit(&mut self, account: &str, amount: Coins) -> LedgerResult<()> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }
        let balance = self.get_balance(account).await?;

        let result = sqlx::query(
            "UPDATE accounts SET balance = balance - $2 WHERE username = $1 AND balance >= $2",
        )
        .bind(account)
        .bind(amount)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::insufficient_balance(account, balance, amount));
        }
        Ok(())
    }

    async fn append_transfer(&mut self, record: TransferRecord) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO transfers (sender, receiver, amount, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.sender)
        .bind(&record.receiver)
        .bind(record.amount)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn append_purchase(&mut self, record: PurchaseRecord) -> LedgerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO purchases (username, item, quantity, unit_price, total_price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.account)
        .bind(&record.item)
        .bind(record.quantity)
        .bind(record.unit_price)
        .bind(record.total_price)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn create_account(&mut self, account: &str, balance: Coins) -> LedgerResult<()> {
        if balance < 0 {
            return Err(LedgerError::invalid_amount(balance));
        }
        let result = sqlx::query(
            "INSERT INTO accounts (username, balance) VALUES ($1, $2) ON CONFLICT (username) DO NOTHING",
        )
        .bind(account)
        .bind(balance)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::username_exists(account));
        }
        Ok(())
    }

    async fn commit(self) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        self.tx.rollback().await?;
        debug!("postgres unit rolled back");
        Ok(())
    }
}
