use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Money, UserAccount};

pub async fn insert_user(username: &str, conn: &mut SqliteConnection) -> Result<UserAccount, sqlx::Error> {
    let now = Utc::now();
    let account = sqlx::query_as(
        "INSERT INTO user_accounts (username, created_at, updated_at) VALUES ($1, $2, $2) RETURNING *",
    )
    .bind(username)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(account)
}

pub async fn user_account_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM user_accounts WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(account)
}

/// Adds `amount` to the user's balance and returns the updated account. Returns `None` if the account does not
/// exist.
pub async fn credit_balance(
    id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as(
        "UPDATE user_accounts SET balance = balance + $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    trace!("🧑️ Credited {amount} to account #{id}");
    Ok(account)
}
