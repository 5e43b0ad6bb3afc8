use std::collections::HashSet;

use chrono::{DateTime, Utc};
use gb_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Dividend, LotteryRecord};

/// A winner resolved to a user identity.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WinnerInfo {
    pub user_id: i64,
    pub username: String,
    pub order_id: i64,
}

/// The outcome of a draw, as returned to the caller that triggered it and to anyone querying the group afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub lottery: LotteryRecord,
    pub winners: Vec<WinnerInfo>,
    pub dividend_count: usize,
    pub dividends: Vec<Dividend>,
}

impl SettlementResult {
    pub fn new(lottery: LotteryRecord, winners: Vec<WinnerInfo>, dividends: Vec<Dividend>) -> Self {
        let dividend_count = dividends.len();
        Self { lottery, winners, dividend_count, dividends }
    }

    pub fn group_id(&self) -> i64 {
        self.lottery.group_id
    }

    pub fn winner_user_ids(&self) -> HashSet<i64> {
        self.winners.iter().map(|w| w.user_id).collect()
    }

    pub fn total_dividends(&self) -> Money {
        self.dividends.iter().map(|d| d.amount).sum()
    }
}

/// One entry in a user's "my winning records" list.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WinningRecord {
    pub lottery_id: i64,
    pub group_id: i64,
    pub group_code: String,
    pub product_id: i64,
    pub order_id: i64,
    pub drawn_at: DateTime<Utc>,
}

/// A re-derivation of a recorded draw from its stored seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawAudit {
    pub lottery_id: i64,
    pub seed: u64,
    /// Winning order ids as recorded, in draw order
    pub recorded: Vec<i64>,
    /// Winning order ids as re-derived, in draw order
    pub replayed: Vec<i64>,
}

impl DrawAudit {
    pub fn is_consistent(&self) -> bool {
        self.recorded == self.replayed
    }
}
