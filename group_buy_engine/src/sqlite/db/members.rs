use sqlx::SqliteConnection;

use crate::db_types::{GroupMember, Participant};

pub async fn insert_member(
    group_id: i64,
    user_id: i64,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<GroupMember, sqlx::Error> {
    let member = sqlx::query_as(
        r#"
            INSERT INTO group_members (group_id, user_id, order_id, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .bind(order_id)
    .bind(chrono::Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(member)
}

pub async fn is_member(group_id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND user_id = $2")
        .bind(group_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// True if the order has already been used to join any group.
pub async fn order_is_bound(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn fetch_members(group_id: i64, conn: &mut SqliteConnection) -> Result<Vec<GroupMember>, sqlx::Error> {
    let members = sqlx::query_as("SELECT * FROM group_members WHERE group_id = $1 ORDER BY id")
        .bind(group_id)
        .fetch_all(conn)
        .await?;
    Ok(members)
}

/// The draw population of a group: the orders bound to the group that are paid, in ascending order id.
pub async fn fetch_paid_participants(
    group_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Participant>, sqlx::Error> {
    let participants = sqlx::query_as(
        r#"
            SELECT orders.id AS order_id, orders.user_id, orders.actual_amount
            FROM group_members INNER JOIN orders ON group_members.order_id = orders.id
            WHERE group_members.group_id = $1 AND orders.status = 'Paid'
            ORDER BY orders.id;
        "#,
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;
    Ok(participants)
}
