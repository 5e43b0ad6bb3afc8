use group_buy_engine::{
    db_types::{GroupBuying, GroupMember, NewGroupBuying},
    settlement_objects::SettlementResult,
    JoinResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenGroupRequest {
    pub group_code: String,
    pub product_id: i64,
    pub leader_id: i64,
    pub group_size: i64,
    #[serde(default)]
    pub team_id: Option<i64>,
}

impl From<OpenGroupRequest> for NewGroupBuying {
    fn from(req: OpenGroupRequest) -> Self {
        let group = NewGroupBuying::new(req.group_code, req.product_id, req.leader_id, req.group_size);
        match req.team_id {
            Some(team_id) => group.with_team(team_id),
            None => group,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JoinGroupRequest {
    pub order_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DrawRequest {
    #[serde(default)]
    pub requesting_user_id: Option<i64>,
}

/// The response to a join. If the join filled the group and triggered a draw, the outcome of that draw is included.
/// A failed draw does not fail the join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub group: GroupBuying,
    pub member: GroupMember,
    pub quorum_reached: bool,
    pub settlement: Option<SettlementResult>,
    pub draw_error: Option<String>,
}

impl From<JoinResult> for JoinResponse {
    fn from(res: JoinResult) -> Self {
        let (settlement, draw_error) = match res.settlement {
            Some(Ok(result)) => (Some(result), None),
            Some(Err(e)) => (None, Some(e.to_string())),
            None => (None, None),
        };
        Self {
            group: res.outcome.group,
            member: res.outcome.member,
            quorum_reached: res.outcome.quorum_reached,
            settlement,
            draw_error,
        }
    }
}
