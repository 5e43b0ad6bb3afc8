use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Dividend, UserAccount},
    gb_api::settlement_objects::SettlementResult,
};

/// Published once per group, after its draw has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettledEvent {
    pub result: SettlementResult,
}

impl GroupSettledEvent {
    pub fn new(result: SettlementResult) -> Self {
        Self { result }
    }
}

/// Published after a dividend has been credited to the user's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendPaidEvent {
    pub dividend: Dividend,
    pub account: UserAccount,
}

impl DividendPaidEvent {
    pub fn new(dividend: Dividend, account: UserAccount) -> Self {
        Self { dividend, account }
    }
}
