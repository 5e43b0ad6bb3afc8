use chrono::{DateTime, Utc};
use log::{trace, warn};
use sqlx::SqliteConnection;

use crate::db_types::{GroupBuying, GroupStatus, NewGroupBuying};

pub async fn insert_group(group: NewGroupBuying, conn: &mut SqliteConnection) -> Result<GroupBuying, sqlx::Error> {
    let group = sqlx::query_as(
        r#"
            INSERT INTO group_buys (group_code, product_id, team_id, leader_id, group_size, started_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(group.group_code)
    .bind(group.product_id)
    .bind(group.team_id)
    .bind(group.leader_id)
    .bind(group.group_size)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(group)
}

pub async fn fetch_group(group_id: i64, conn: &mut SqliteConnection) -> Result<Option<GroupBuying>, sqlx::Error> {
    let group = sqlx::query_as("SELECT * FROM group_buys WHERE id = $1").bind(group_id).fetch_optional(conn).await?;
    Ok(group)
}

/// Takes the database write lock for the rest of the transaction by issuing a no-op update on the group row.
///
/// SQLite transactions start out as readers. A transaction that reads and then tries to write can fail with
/// `SQLITE_BUSY` if another writer got in first, and that error is not retried by the busy handler. Writing first
/// makes concurrent writers queue on the busy timeout instead.
///
/// Returns `false` if the group does not exist.
pub async fn lock_group(group_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE group_buys SET id = id WHERE id = $1").bind(group_id).execute(conn).await?;
    trace!("🗃️ Write lock taken for group {group_id}");
    Ok(result.rows_affected() == 1)
}

/// Persists the new member count and status of a group after a join.
///
/// `group` is the row as read earlier in the same transaction. The update is refused, and `None` returned, if `status`
/// would move the group backwards or the stored status is no longer the one that was read.
pub async fn update_progress(
    group: &GroupBuying,
    current_members: i64,
    status: GroupStatus,
    ended_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Option<GroupBuying>, sqlx::Error> {
    if status != group.status && !group.status.can_transition_to(status) {
        warn!("🗃️ Refusing to move group {} from {} back to {status}", group.id, group.status);
        return Ok(None);
    }
    let group = sqlx::query_as(
        r#"
            UPDATE group_buys SET current_members = $1, status = $2, ended_at = COALESCE($3, ended_at)
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(current_members)
    .bind(status.to_string())
    .bind(ended_at)
    .bind(group.id)
    .bind(group.status.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(group)
}

/// Moves a group to `Settled`. Returns `None` if the group, as read earlier in the transaction, cannot be settled or
/// its stored status has changed since.
pub async fn mark_settled(
    group: &GroupBuying,
    success_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<GroupBuying>, sqlx::Error> {
    if !group.status.can_transition_to(GroupStatus::Settled) {
        warn!("🗃️ Group {} is {} and cannot be settled", group.id, group.status);
        return Ok(None);
    }
    let group = sqlx::query_as(
        r#"
            UPDATE group_buys SET status = 'Settled', success_at = $1
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(success_at)
    .bind(group.id)
    .bind(group.status.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(group)
}
