//! `PostgreSQL` debit card repository.

use super::{database_error, is_unique_violation, parse_column};
use crate::error::{AccountError, Result};
use crate::model::{AccountId, CardId, CustomerId, DebitCard};
use crate::providers::DebitCardRepository;
use futures::future::{BoxFuture, FutureExt};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const COLUMNS: &str = "id, card_number, customer_id, status, primary_account_id, \
     associated_account_ids, expiration_date, created_at, modified_at";

/// `PostgreSQL` debit card repository.
#[derive(Clone)]
pub struct PostgresDebitCardRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresDebitCardRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, predicate: &str, value: &str) -> Result<Vec<DebitCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM debit_cards WHERE {predicate} ORDER BY created_at"
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load debit cards", &e))?;
        rows.iter().map(row_to_card).collect()
    }
}

impl DebitCardRepository for PostgresDebitCardRepository {
    fn find_by_id<'a>(&'a self, id: &'a CardId) -> BoxFuture<'a, Result<Option<DebitCard>>> {
        async move { Ok(self.fetch_where("id = $1", id.as_str()).await?.pop()) }.boxed()
    }

    fn find_by_card_number<'a>(
        &'a self,
        card_number: &'a str,
    ) -> BoxFuture<'a, Result<Option<DebitCard>>> {
        async move { Ok(self.fetch_where("card_number = $1", card_number).await?.pop()) }.boxed()
    }

    fn exists_by_card_number<'a>(&'a self, card_number: &'a str) -> BoxFuture<'a, Result<bool>> {
        async move {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM debit_cards WHERE card_number = $1)")
                .bind(card_number)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| database_error("Failed to check card number", &e))
        }
        .boxed()
    }

    fn find_by_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>> {
        async move { self.fetch_where("customer_id = $1", customer_id.as_str()).await }.boxed()
    }

    fn find_by_primary_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>> {
        async move {
            self.fetch_where("primary_account_id = $1", account_id.as_str())
                .await
        }
        .boxed()
    }

    fn find_by_associated_account<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Vec<DebitCard>>> {
        async move {
            self.fetch_where("$1 = ANY (associated_account_ids)", account_id.as_str())
                .await
        }
        .boxed()
    }

    fn save<'a>(&'a self, card: &'a DebitCard) -> BoxFuture<'a, Result<DebitCard>> {
        async move {
            let associated: Vec<&str> = card
                .associated_account_ids
                .iter()
                .map(AccountId::as_str)
                .collect();

            sqlx::query(
                r"
                INSERT INTO debit_cards (
                    id, card_number, customer_id, status, primary_account_id,
                    associated_account_ids, expiration_date, created_at, modified_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO UPDATE SET
                    status = EXCLUDED.status,
                    primary_account_id = EXCLUDED.primary_account_id,
                    associated_account_ids = EXCLUDED.associated_account_ids,
                    modified_at = EXCLUDED.modified_at
                ",
            )
            .bind(card.id.as_str())
            .bind(&card.card_number)
            .bind(card.customer_id.as_str())
            .bind(card.status.as_str())
            .bind(card.primary_account_id.as_str())
            .bind(associated)
            .bind(card.expiration_date)
            .bind(card.created_at)
            .bind(card.modified_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AccountError::DuplicateCardNumber;
                }
                database_error("Failed to save debit card", &e)
            })?;

            Ok(card.clone())
        }
        .boxed()
    }
}

fn row_to_card(row: &PgRow) -> Result<DebitCard> {
    let get_err = |e: sqlx::Error| database_error("Failed to decode debit card", &e);
    let associated: Vec<String> = row.try_get("associated_account_ids").map_err(get_err)?;

    Ok(DebitCard {
        id: CardId(row.try_get("id").map_err(get_err)?),
        card_number: row.try_get("card_number").map_err(get_err)?,
        customer_id: CustomerId(row.try_get("customer_id").map_err(get_err)?),
        status: parse_column(row, "status")?,
        primary_account_id: AccountId(row.try_get("primary_account_id").map_err(get_err)?),
        associated_account_ids: associated.into_iter().map(AccountId).collect(),
        expiration_date: row.try_get("expiration_date").map_err(get_err)?,
        created_at: row.try_get("created_at").map_err(get_err)?,
        modified_at: row.try_get("modified_at").map_err(get_err)?,
    })
}
