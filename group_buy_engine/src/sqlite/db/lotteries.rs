use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{LotteryRecord, LotteryStatus, Participant},
    gb_api::settlement_objects::{WinnerInfo, WinningRecord},
    traits::SettlementPlan,
};

/// Inserts the lottery record for a plan with status `Drawn`.
///
/// A second drawn record for the same group violates the `lottery_records_one_draw_per_group` index, and the caller
/// sees a unique-constraint error.
pub async fn insert_drawn_record(
    plan: &SettlementPlan,
    drawn_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<LotteryRecord, sqlx::Error> {
    #[allow(clippy::cast_possible_wrap)]
    let seed = plan.draw_seed as i64;
    let record = sqlx::query_as(
        r#"
            INSERT INTO lottery_records (
                group_id,
                product_id,
                winner_count,
                participant_count,
                pool_amount,
                dividend_rate,
                draw_method,
                draw_seed,
                status,
                drawn_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(plan.group_id)
    .bind(plan.product_id)
    .bind(plan.winner_count)
    .bind(plan.participant_count())
    .bind(plan.pool_amount)
    .bind(plan.dividend_rate)
    .bind(plan.draw_method.to_string())
    .bind(seed)
    .bind(LotteryStatus::Drawn.to_string())
    .bind(drawn_at)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn insert_winners(
    lottery_id: i64,
    winners: &[Participant],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for winner in winners {
        sqlx::query("INSERT INTO lottery_winners (lottery_id, user_id, order_id) VALUES ($1, $2, $3)")
            .bind(lottery_id)
            .bind(winner.user_id)
            .bind(winner.order_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Takes the database write lock for the rest of the transaction. See [`super::group_buys::lock_group`].
///
/// Returns `false` if the lottery does not exist.
pub async fn lock_record(lottery_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE lottery_records SET id = id WHERE id = $1").bind(lottery_id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_drawn_record_for_group(
    group_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<LotteryRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM lottery_records WHERE group_id = $1 AND status = 'Drawn'")
        .bind(group_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn fetch_record(lottery_id: i64, conn: &mut SqliteConnection) -> Result<Option<LotteryRecord>, sqlx::Error> {
    let record =
        sqlx::query_as("SELECT * FROM lottery_records WHERE id = $1").bind(lottery_id).fetch_optional(conn).await?;
    Ok(record)
}

/// The winners of a lottery with their usernames, in the order they were drawn.
pub async fn fetch_winner_info(lottery_id: i64, conn: &mut SqliteConnection) -> Result<Vec<WinnerInfo>, sqlx::Error> {
    let winners = sqlx::query_as(
        r#"
            SELECT lottery_winners.user_id, user_accounts.username, lottery_winners.order_id
            FROM lottery_winners INNER JOIN user_accounts ON lottery_winners.user_id = user_accounts.id
            WHERE lottery_winners.lottery_id = $1
            ORDER BY lottery_winners.id;
        "#,
    )
    .bind(lottery_id)
    .fetch_all(conn)
    .await?;
    Ok(winners)
}

/// Every draw the user has won, most recent first.
pub async fn fetch_winning_records_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<WinningRecord>, sqlx::Error> {
    let records = sqlx::query_as(
        r#"
            SELECT
                lottery_records.id AS lottery_id,
                lottery_records.group_id,
                group_buys.group_code,
                lottery_records.product_id,
                lottery_winners.order_id,
                lottery_records.drawn_at
            FROM lottery_winners
                INNER JOIN lottery_records ON lottery_winners.lottery_id = lottery_records.id
                INNER JOIN group_buys ON lottery_records.group_id = group_buys.id
            WHERE lottery_winners.user_id = $1 AND lottery_records.status = 'Drawn'
            ORDER BY lottery_records.id DESC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(records)
}
