use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Dividend, Money, Participant},
    gb_api::settlement_objects::{DrawAudit, SettlementResult, WinningRecord},
    settlement::{replay_draw, SettlementError},
    traits::SettlementQueries,
};

/// `ResultsApi` provides the read-only views over settled groups: the result of a group's draw, a user's winning
/// records and a user's dividends.
pub struct ResultsApi<B> {
    db: B,
}

impl<B> Debug for ResultsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResultsApi")
    }
}

impl<B> ResultsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ResultsApi<B>
where B: SettlementQueries
{
    /// The result of the group's draw, or `None` if the group has not been drawn yet.
    pub async fn result_for_group(&self, group_id: i64) -> Result<Option<SettlementResult>, SettlementError> {
        if self.db.fetch_group(group_id).await?.is_none() {
            return Err(SettlementError::GroupNotFound(group_id));
        }
        let result = self.db.fetch_settlement_for_group(group_id).await?;
        Ok(result)
    }

    pub async fn winning_records(&self, user_id: i64) -> Result<Vec<WinningRecord>, SettlementError> {
        let records = self.db.fetch_winning_records_for_user(user_id).await?;
        trace!("📊️ User {user_id} has {} winning records", records.len());
        Ok(records)
    }

    pub async fn dividend_records(&self, user_id: i64) -> Result<Vec<Dividend>, SettlementError> {
        let dividends = self.db.fetch_dividends_for_user(user_id).await?;
        trace!("📊️ User {user_id} has {} dividend records", dividends.len());
        Ok(dividends)
    }

    /// Replays a group's draw from its recorded seed.
    ///
    /// The draw population is rebuilt from the stored winners and dividend recipients, which between them are exactly
    /// the paid participants at draw time.
    pub async fn verify_draw(&self, group_id: i64) -> Result<DrawAudit, SettlementError> {
        let group = self.db.fetch_group(group_id).await?.ok_or(SettlementError::GroupNotFound(group_id))?;
        let result = self.db.fetch_settlement_for_group(group_id).await?.ok_or(SettlementError::GroupNotReady {
            group_id,
            current_members: group.current_members,
            group_size: group.group_size,
        })?;
        let population = result
            .winners
            .iter()
            .map(|w| (w.order_id, w.user_id))
            .chain(result.dividends.iter().map(|d| (d.order_id, d.user_id)))
            .map(|(order_id, user_id)| Participant { order_id, user_id, actual_amount: Money::default() })
            .collect::<Vec<_>>();
        let winner_count = usize::try_from(result.lottery.winner_count).unwrap_or_default();
        let replayed = replay_draw(&population, winner_count, result.lottery.seed())?;
        let audit = DrawAudit {
            lottery_id: result.lottery.id,
            seed: result.lottery.seed(),
            recorded: result.winners.iter().map(|w| w.order_id).collect(),
            replayed: replayed.iter().map(|p| p.order_id).collect(),
        };
        if audit.is_consistent() {
            debug!("📊️ Draw {} for group {group_id} replays consistently", audit.lottery_id);
        } else {
            error!(
                "📊️ Draw {} for group {group_id} does not replay. Recorded {:?}, replayed {:?}",
                audit.lottery_id, audit.recorded, audit.replayed
            );
        }
        Ok(audit)
    }
}
