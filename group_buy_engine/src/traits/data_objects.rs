use gb_common::{DividendRate, Money};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{DrawMethod, GroupBuying, GroupMember, GroupStatus, Participant},
    settlement::DividendAllocation,
};

/// A membership event: `user_id` is joining `group_id` with `order_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub group_id: i64,
    pub order_id: i64,
    pub user_id: i64,
}

impl JoinRequest {
    pub fn new(group_id: i64, order_id: i64, user_id: i64) -> Self {
        Self { group_id, order_id, user_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    /// The group after the join was applied
    pub group: GroupBuying,
    pub member: GroupMember,
    /// True only for the join that filled the group. This is the settlement trigger.
    pub quorum_reached: bool,
}

/// Everything the ledger needs to commit a draw. Produced by the settlement orchestrator from a snapshot of the
/// group, and validated against the stored state again at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub group_id: i64,
    pub product_id: i64,
    /// The group status the plan was computed against
    pub expected_status: GroupStatus,
    /// The paid population the plan was computed against, ascending by order id
    pub participants: Vec<Participant>,
    pub winner_count: i64,
    pub pool_amount: Money,
    pub dividend_rate: DividendRate,
    pub draw_method: DrawMethod,
    pub draw_seed: u64,
    pub winners: Vec<Participant>,
    pub dividends: Vec<DividendAllocation>,
}

impl SettlementPlan {
    #[allow(clippy::cast_possible_wrap)]
    pub fn participant_count(&self) -> i64 {
        self.participants.len() as i64
    }

    pub fn total_dividends(&self) -> Money {
        self.dividends.iter().map(|d| d.amount).sum()
    }
}
