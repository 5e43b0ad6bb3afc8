use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{db_types::Dividend, settlement::DividendAllocation};

pub async fn insert_dividends(
    lottery_id: i64,
    allocations: &[DividendAllocation],
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Dividend>, sqlx::Error> {
    let mut result = Vec::with_capacity(allocations.len());
    for alloc in allocations {
        let dividend = sqlx::query_as(
            r#"
                INSERT INTO dividends (lottery_id, user_id, order_id, amount, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *;
            "#,
        )
        .bind(lottery_id)
        .bind(alloc.user_id)
        .bind(alloc.order_id)
        .bind(alloc.amount)
        .bind(created_at)
        .fetch_one(&mut *conn)
        .await?;
        result.push(dividend);
    }
    Ok(result)
}

pub async fn fetch_dividend(id: i64, conn: &mut SqliteConnection) -> Result<Option<Dividend>, sqlx::Error> {
    let dividend = sqlx::query_as("SELECT * FROM dividends WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(dividend)
}

pub async fn fetch_dividends_for_lottery(
    lottery_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Dividend>, sqlx::Error> {
    let dividends = sqlx::query_as("SELECT * FROM dividends WHERE lottery_id = $1 ORDER BY order_id")
        .bind(lottery_id)
        .fetch_all(conn)
        .await?;
    Ok(dividends)
}

pub async fn fetch_dividends_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Dividend>, sqlx::Error> {
    let dividends = sqlx::query_as("SELECT * FROM dividends WHERE user_id = $1 ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(dividends)
}

/// Flips a dividend from `Pending` to `Paid`. Returns `None` if the dividend does not exist or was already paid, so
/// that a dividend can only ever be paid once even under concurrent callers.
pub async fn mark_paid(
    id: i64,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Dividend>, sqlx::Error> {
    let dividend = sqlx::query_as(
        "UPDATE dividends SET status = 'Paid', paid_at = $1 WHERE id = $2 AND status = 'Pending' RETURNING *",
    )
    .bind(paid_at)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(dividend)
}
