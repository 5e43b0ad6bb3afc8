//! The settlement orchestrator.
//!
//! [`SettlementApi`] turns a group that has reached its quota into a settled group: it checks eligibility, draws the
//! winners, computes the dividends and hands the whole plan to the ledger to commit in one transaction.
//!
//! ## At most one draw per group
//! Three things stand between a group and a second draw:
//! 1. In-process callers are serialised by a per-group async lock, so only one plan per group is in flight.
//! 2. The plan is checked against the stored state at commit time. If the group or its paid population changed, the
//!    commit is refused and the orchestrator plans again, up to [`SettlementConfig::max_attempts`] times.
//! 3. The ledger has a unique index on drawn lotteries per group, which catches writers in other processes.
//!
//! Whichever way a duplicate is caught, the caller receives [`SettlementError::AlreadySettled`] carrying the result of
//! the draw that did happen.
use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use log::*;

use crate::{
    db_types::{DrawMethod, ProductConfig},
    events::{EventProducers, GroupSettledEvent},
    gb_api::settlement_objects::SettlementResult,
    settlement::{check_ready_for_draw, compute_dividends, pool_amount, random_draw, RoundingPolicy, SettlementError},
    traits::{JoinOutcome, LedgerError, LedgerManagement, SettlementPlan},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementConfig {
    pub rounding_policy: RoundingPolicy,
    /// How many times a draw is planned before giving up on a group whose state keeps changing underneath it
    pub max_attempts: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { rounding_policy: RoundingPolicy::default(), max_attempts: 3 }
    }
}

/// One async mutex per group that currently has a draw in flight.
#[derive(Default)]
struct GroupLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl GroupLocks {
    fn acquire(&self, group_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(group_id).or_default())
    }

    /// Drops the map entry once nobody else is holding or waiting on it.
    fn release(&self, group_id: i64, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&group_id);
        }
    }
}

pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    config: SettlementConfig,
    locks: Arc<GroupLocks>,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.config)
    }
}

/// Clones share the per-group locks, so every clone serialises draws with every other.
impl<B: Clone> Clone for SettlementApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            producers: self.producers.clone(),
            config: self.config,
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, config: SettlementConfig::default(), locks: Arc::new(GroupLocks::default()) }
    }

    pub fn with_config(mut self, config: SettlementConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> SettlementApi<B>
where B: LedgerManagement
{
    /// Performs the draw for a group.
    ///
    /// `requested_by` identifies who triggered the draw, for the log. Authorisation is the caller's job.
    ///
    /// On success the group is `Settled`, and the lottery record, winners and pending dividends are stored. On failure
    /// nothing has changed and the call can be retried once the cause is resolved. A group that has already been drawn
    /// fails with [`SettlementError::AlreadySettled`], which carries the original result.
    pub async fn draw(&self, group_id: i64, requested_by: Option<i64>) -> Result<SettlementResult, SettlementError> {
        match requested_by {
            Some(user) => info!("🎲️ Draw for group {group_id} requested by user {user}"),
            None => info!("🎲️ Draw for group {group_id} triggered automatically"),
        }
        let lock = self.locks.acquire(group_id);
        let result = {
            let _guard = lock.lock().await;
            trace!("🎲️ Settlement lock acquired for group {group_id}");
            self.settle_with_retries(group_id).await
        };
        self.locks.release(group_id, lock);
        match &result {
            Ok(settlement) => {
                info!(
                    "🎲️ Group {group_id} settled. Lottery {}: {} winners, {} dividends",
                    settlement.lottery.id,
                    settlement.winners.len(),
                    settlement.dividend_count
                );
                self.call_group_settled_hook(settlement).await;
            },
            Err(SettlementError::AlreadySettled(_)) => debug!("🎲️ Group {group_id} was already settled"),
            Err(e) => warn!("🎲️ Draw for group {group_id} failed. {e}"),
        }
        result
    }

    /// Settles the group if this join was the one that filled it. Returns `None` otherwise.
    pub async fn settle_if_quorum(&self, join: &JoinOutcome) -> Option<Result<SettlementResult, SettlementError>> {
        if !join.quorum_reached {
            return None;
        }
        Some(self.draw(join.group.id, None).await)
    }

    async fn settle_with_retries(&self, group_id: i64) -> Result<SettlementResult, SettlementError> {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            let plan = self.plan_settlement(group_id).await?;
            match self.db.commit_settlement(plan).await {
                Ok(result) => return Ok(result),
                Err(LedgerError::AlreadySettled(_)) => return Err(self.already_settled(group_id).await),
                Err(LedgerError::StaleSnapshot(_)) => {
                    warn!("🎲️ Group {group_id} changed while its draw was being planned (attempt {attempt}/{attempts})");
                },
                Err(e) => return Err(e.into()),
            }
        }
        Err(SettlementError::PersistenceFailure(format!(
            "Group {group_id} kept changing during settlement. Gave up after {attempts} attempts"
        )))
    }

    /// Builds a settlement plan from the current state of the group. Nothing is written.
    pub async fn plan_settlement(&self, group_id: i64) -> Result<SettlementPlan, SettlementError> {
        let group = self.db.fetch_group(group_id).await?.ok_or(SettlementError::GroupNotFound(group_id))?;
        if let Some(prior) = self.db.fetch_settlement_for_group(group_id).await? {
            return Err(SettlementError::AlreadySettled(Box::new(prior)));
        }
        let product = self
            .db
            .fetch_product_config(group.product_id)
            .await?
            .ok_or(SettlementError::ProductNotFound(group.product_id))?;
        let winner_count = validate_product(&product)?;
        check_ready_for_draw(&group)?;
        let participants = self.db.fetch_paid_participants(group_id).await?;
        if participants.is_empty() {
            return Err(SettlementError::NoParticipants(group_id));
        }
        if participants.len() < winner_count {
            return Err(SettlementError::InsufficientParticipants {
                participants: participants.len(),
                winners: winner_count,
            });
        }
        let outcome = random_draw(&participants, winner_count)?;
        let winner_users = outcome.winners.iter().map(|w| w.user_id).collect::<HashSet<_>>();
        let dividends =
            compute_dividends(&participants, &winner_users, product.dividend_rate, self.config.rounding_policy)?;
        let pool = pool_amount(&participants);
        let mut participants = participants;
        participants.sort_by_key(|p| p.order_id);
        let plan = SettlementPlan {
            group_id,
            product_id: product.id,
            expected_status: group.status,
            participants,
            winner_count: product.winner_count,
            pool_amount: pool,
            dividend_rate: product.dividend_rate,
            draw_method: DrawMethod::FisherYates,
            draw_seed: outcome.seed,
            winners: outcome.winners,
            dividends,
        };
        debug!(
            "🎲️ Plan for group {group_id}: {} participants, pool {}, {} winners, {} in dividends",
            plan.participant_count(),
            plan.pool_amount,
            plan.winners.len(),
            plan.total_dividends()
        );
        Ok(plan)
    }

    async fn already_settled(&self, group_id: i64) -> SettlementError {
        match self.db.fetch_settlement_for_group(group_id).await {
            Ok(Some(prior)) => SettlementError::AlreadySettled(Box::new(prior)),
            Ok(None) => {
                error!("🎲️ Group {group_id} was reported as drawn, but its lottery record cannot be found");
                SettlementError::PersistenceFailure(format!("The draw record for group {group_id} is missing"))
            },
            Err(e) => e.into(),
        }
    }

    async fn call_group_settled_hook(&self, result: &SettlementResult) {
        for emitter in &self.producers.group_settled_producer {
            debug!("🎲️ Notifying group settled hook subscribers");
            emitter.publish_event(GroupSettledEvent::new(result.clone())).await;
        }
    }
}

/// The catalog guarantees these with CHECK constraints, but a product read from elsewhere may not.
fn validate_product(product: &ProductConfig) -> Result<usize, SettlementError> {
    if product.dividend_rate.is_negative() {
        return Err(SettlementError::InvalidProductConfig {
            product_id: product.id,
            reason: format!("The dividend rate cannot be negative ({})", product.dividend_rate),
        });
    }
    match usize::try_from(product.winner_count) {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(SettlementError::InvalidProductConfig {
            product_id: product.id,
            reason: format!("The winner count must be at least 1, not {}", product.winner_count),
        }),
    }
}
