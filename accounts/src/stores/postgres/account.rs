//! `PostgreSQL` account repository.

use super::{database_error, is_unique_violation, parse_column};
use crate::error::{AccountError, Result};
use crate::model::{Account, AccountId, CustomerId};
use crate::providers::AccountRepository;
use futures::future::{BoxFuture, FutureExt};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const COLUMNS: &str = "id, customer_id, account_type, balance, is_vip, min_balance_requirement, \
     is_pym, maintenance_fee, holders, signers, max_free_transaction, transaction_cost, \
     created_at, modified_at";

/// `PostgreSQL` account repository.
#[derive(Clone)]
pub struct PostgresAccountRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write(&self, account: &Account, exclusive_slot: Option<String>) -> Result<Account> {
        sqlx::query(
            r"
            INSERT INTO accounts (
                id, customer_id, account_type, balance, is_vip, min_balance_requirement,
                is_pym, maintenance_fee, holders, signers, max_free_transaction,
                transaction_cost, exclusive_slot, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                balance = EXCLUDED.balance,
                is_vip = EXCLUDED.is_vip,
                min_balance_requirement = EXCLUDED.min_balance_requirement,
                is_pym = EXCLUDED.is_pym,
                maintenance_fee = EXCLUDED.maintenance_fee,
                holders = EXCLUDED.holders,
                signers = EXCLUDED.signers,
                max_free_transaction = EXCLUDED.max_free_transaction,
                transaction_cost = EXCLUDED.transaction_cost,
                modified_at = EXCLUDED.modified_at
            ",
        )
        .bind(account.id.as_str())
        .bind(account.customer_id.as_str())
        .bind(account.account_type.as_str())
        .bind(account.balance)
        .bind(account.is_vip)
        .bind(account.min_balance_requirement)
        .bind(account.is_pym)
        .bind(account.maintenance_fee)
        .bind(&account.holders)
        .bind(&account.signers)
        .bind(account.max_free_transaction)
        .bind(account.transaction_cost)
        .bind(exclusive_slot)
        .bind(account.created_at)
        .bind(account.modified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AccountError::DuplicateAccountType {
                    account_type: account.account_type,
                };
            }
            database_error("Failed to save account", &e)
        })?;

        Ok(account.clone())
    }

    async fn fetch_many(&self, sql: &str, bind: Option<&str>) -> Result<Vec<Account>> {
        let mut query = sqlx::query::<sqlx::Postgres>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("Failed to load accounts", &e))?;
        rows.iter().map(row_to_account).collect()
    }
}

impl AccountRepository for PostgresAccountRepository {
    fn find_by_id<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, Result<Option<Account>>> {
        async move {
            let row = sqlx::query(&format!("SELECT {COLUMNS} FROM accounts WHERE id = $1"))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("Failed to load account", &e))?;
            row.as_ref().map(row_to_account).transpose()
        }
        .boxed()
    }

    fn find_all(&self) -> BoxFuture<'_, Result<Vec<Account>>> {
        async move {
            self.fetch_many(
                &format!("SELECT {COLUMNS} FROM accounts ORDER BY created_at"),
                None,
            )
            .await
        }
        .boxed()
    }

    fn find_by_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<Account>>> {
        async move {
            self.fetch_many(
                &format!(
                    "SELECT {COLUMNS} FROM accounts WHERE customer_id = $1 ORDER BY created_at"
                ),
                Some(customer_id.as_str()),
            )
            .await
        }
        .boxed()
    }

    fn insert_exclusive<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<Account>> {
        async move {
            let slot = format!("{}:{}", account.customer_id, account.account_type);
            self.write(account, Some(slot)).await
        }
        .boxed()
    }

    fn save<'a>(&'a self, account: &'a Account) -> BoxFuture<'a, Result<Account>> {
        async move { self.write(account, None).await }.boxed()
    }

    fn delete<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, Result<bool>> {
        async move {
            let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("Failed to delete account", &e))?;
            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }
}

fn row_to_account(row: &PgRow) -> Result<Account> {
    let get_err = |e: sqlx::Error| database_error("Failed to decode account", &e);

    Ok(Account {
        id: AccountId(row.try_get("id").map_err(get_err)?),
        customer_id: CustomerId(row.try_get("customer_id").map_err(get_err)?),
        account_type: parse_column(row, "account_type")?,
        balance: row.try_get("balance").map_err(get_err)?,
        is_vip: row.try_get("is_vip").map_err(get_err)?,
        min_balance_requirement: row.try_get("min_balance_requirement").map_err(get_err)?,
        is_pym: row.try_get("is_pym").map_err(get_err)?,
        maintenance_fee: row.try_get("maintenance_fee").map_err(get_err)?,
        holders: row.try_get("holders").map_err(get_err)?,
        signers: row.try_get("signers").map_err(get_err)?,
        max_free_transaction: row.try_get("max_free_transaction").map_err(get_err)?,
        transaction_cost: row.try_get("transaction_cost").map_err(get_err)?,
        created_at: row.try_get("created_at").map_err(get_err)?,
        modified_at: row.try_get("modified_at").map_err(get_err)?,
    })
}
