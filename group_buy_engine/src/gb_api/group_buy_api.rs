use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{GroupBuying, NewGroupBuying},
    gb_api::{settlement_api::SettlementApi, settlement_objects::SettlementResult},
    settlement::SettlementError,
    traits::{JoinOutcome, JoinRequest, LedgerManagement},
};

/// The outcome of a join, and of the draw it triggered, if any.
#[derive(Debug, Clone)]
pub struct JoinResult {
    pub outcome: JoinOutcome,
    /// `None` unless this join filled the group and automatic draws are enabled. A failed draw does not undo the
    /// join; the group stays `Active` and can be drawn explicitly.
    pub settlement: Option<Result<SettlementResult, SettlementError>>,
}

/// `GroupBuyApi` manages group buy campaigns: opening groups and recording members as they join.
pub struct GroupBuyApi<B> {
    db: B,
    settlement: SettlementApi<B>,
    auto_draw_on_quorum: bool,
}

impl<B> Debug for GroupBuyApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupBuyApi (auto draw: {})", self.auto_draw_on_quorum)
    }
}

impl<B> GroupBuyApi<B> {
    /// Automatic draws are on by default.
    pub fn new(db: B, settlement: SettlementApi<B>) -> Self {
        Self { db, settlement, auto_draw_on_quorum: true }
    }

    pub fn with_auto_draw(mut self, enabled: bool) -> Self {
        self.auto_draw_on_quorum = enabled;
        self
    }
}

impl<B> GroupBuyApi<B>
where B: LedgerManagement
{
    pub async fn open_group(&self, group: NewGroupBuying) -> Result<GroupBuying, SettlementError> {
        let group = self.db.open_group(group).await?;
        info!("👥️ Group buy {} [{}] is open. Waiting for {} members", group.id, group.group_code, group.group_size);
        Ok(group)
    }

    pub async fn group(&self, group_id: i64) -> Result<GroupBuying, SettlementError> {
        self.db.fetch_group(group_id).await?.ok_or(SettlementError::GroupNotFound(group_id))
    }

    /// Records a join event. If it fills the group and automatic draws are enabled, the group is settled straight
    /// away.
    pub async fn join_group(&self, join: JoinRequest) -> Result<JoinResult, SettlementError> {
        let outcome = self.db.record_join(join).await?;
        let group = &outcome.group;
        debug!(
            "👥️ User {} joined group {} ({}/{})",
            join.user_id, group.id, group.current_members, group.group_size
        );
        let settlement = if self.auto_draw_on_quorum {
            self.settlement.settle_if_quorum(&outcome).await
        } else {
            if outcome.quorum_reached {
                info!("👥️ Group {} is full and ready for its draw", group.id);
            }
            None
        };
        if let Some(Err(e)) = &settlement {
            warn!("👥️ Group {} is full, but the automatic draw failed. {e}", group.id);
        }
        Ok(JoinResult { outcome, settlement })
    }
}
