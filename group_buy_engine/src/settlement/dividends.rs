//! Dividend calculation.
//!
//! Every paid participant that did not win receives an equal share of `pool × rate`, where the pool is the total
//! actual amount of *all* participants, winners included. All arithmetic is done in integer cents (widened to `i128`)
//! so that no floating point error ever reaches a balance.
use std::{collections::HashSet, fmt::Display, str::FromStr};

use gb_common::{DividendRate, Money};
use serde::{Deserialize, Serialize};

use crate::{db_types::Participant, settlement::SettlementError};

/// How a share that does not divide evenly into cents is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingPolicy {
    /// Each allocation is rounded half-up to the cent on its own. Every recipient receives the same amount; the total
    /// may differ from the ideal by up to half a cent per recipient.
    #[default]
    HalfUpPerAllocation,
    /// The total is rounded half-up to the cent, split evenly, and the leftover cents are handed out one at a time to
    /// recipients in ascending order id. The total is then exact to the cent.
    LargestRemainder,
}

impl Display for RoundingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HalfUpPerAllocation => f.write_str("half_up"),
            Self::LargestRemainder => f.write_str("largest_remainder"),
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half_up" | "half-up" => Ok(Self::HalfUpPerAllocation),
            "largest_remainder" | "largest-remainder" => Ok(Self::LargestRemainder),
            other => Err(format!("Unknown rounding policy: {other}")),
        }
    }
}

/// One dividend obligation, before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendAllocation {
    pub user_id: i64,
    pub order_id: i64,
    pub amount: Money,
}

/// The total actual amount of the participants.
pub fn pool_amount(participants: &[Participant]) -> Money {
    participants.iter().map(|p| p.actual_amount).sum()
}

/// `pool × rate`, rounded half-up to the cent.
pub fn ideal_total(pool: Money, rate: DividendRate) -> Money {
    let pool = i128::from(pool.value());
    let rate = i128::from(rate.hundredths());
    let scale = i128::from(DividendRate::SCALE);
    Money::from(clamp_to_i64(round_div(pool * rate, scale)))
}

/// Computes the dividend owed to every participant whose user is not in `winners`.
///
/// Fails with [`SettlementError::NoDividendRecipients`] when every participant won.
pub fn compute_dividends(
    participants: &[Participant],
    winners: &HashSet<i64>,
    rate: DividendRate,
    policy: RoundingPolicy,
) -> Result<Vec<DividendAllocation>, SettlementError> {
    let mut recipients = participants.iter().filter(|p| !winners.contains(&p.user_id)).collect::<Vec<_>>();
    if recipients.is_empty() {
        return Err(SettlementError::NoDividendRecipients { participants: participants.len() });
    }
    recipients.sort_by_key(|p| p.order_id);
    let n = recipients.len() as i128;
    let pool = i128::from(pool_amount(participants).value());
    let rate = i128::from(rate.hundredths());
    let scale = i128::from(DividendRate::SCALE);
    let amounts: Vec<i128> = match policy {
        RoundingPolicy::HalfUpPerAllocation => {
            let share = round_div(pool * rate, scale * n);
            vec![share; recipients.len()]
        },
        RoundingPolicy::LargestRemainder => {
            let total = round_div(pool * rate, scale);
            let base = total / n;
            let extra = total % n;
            (0..n).map(|i| if i < extra { base + 1 } else { base }).collect()
        },
    };
    let allocations = recipients
        .into_iter()
        .zip(amounts)
        .map(|(p, amount)| DividendAllocation {
            user_id: p.user_id,
            order_id: p.order_id,
            amount: Money::from(clamp_to_i64(amount)),
        })
        .collect();
    Ok(allocations)
}

/// Integer division, rounding half away from zero. `denom` must be positive.
fn round_div(num: i128, denom: i128) -> i128 {
    if num >= 0 {
        (2 * num + denom) / (2 * denom)
    } else {
        -((-2 * num + denom) / (2 * denom))
    }
}

fn clamp_to_i64(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}
