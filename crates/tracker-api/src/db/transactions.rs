//! Transaction persistence operations on the `transactions` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracker_core::{Money, Transaction, TransactionId, UserId};
use uuid::Uuid;

/// Insert a new transaction.
pub async fn insert(pool: &PgPool, tx: &Transaction) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transactions (id, date, other_user, other_text, amount_cents, description)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(*tx.id.as_uuid())
    .bind(tx.date)
    .bind(tx.other.map(|u| *u.as_uuid()))
    .bind(&tx.other_text)
    .bind(tx.amount.cents())
    .bind(&tx.description)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all transactions on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        "SELECT id, date, other_user, other_text, amount_cents, description
         FROM transactions ORDER BY date",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TransactionRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    date: NaiveDate,
    other_user: Option<Uuid>,
    other_text: String,
    amount_cents: i64,
    description: String,
}

impl TransactionRow {
    fn into_record(self) -> Transaction {
        Transaction {
            id: TransactionId::from_uuid(self.id),
            date: self.date,
            other: self.other_user.map(UserId::from_uuid),
            other_text: self.other_text,
            amount: Money::from_cents(self.amount_cents),
            description: self.description,
        }
    }
}
