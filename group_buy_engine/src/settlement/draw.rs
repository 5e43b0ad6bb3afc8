//! Winner selection.
//!
//! A draw is a Fisher-Yates shuffle of the participants, sorted by order id first so that the input to the shuffle
//! does not depend on the order the database happened to return rows in. The first `winner_count` entries of the
//! shuffled list win.
//!
//! Every draw is driven by a 64-bit seed that is recorded with the lottery. Given the same participants and the same
//! seed, [`replay_draw`] reproduces the winners exactly, which makes every settlement auditable.
use rand::{rngs::StdRng, seq::SliceRandom, thread_rng, Rng, SeedableRng};

use crate::{db_types::Participant, settlement::SettlementError};

/// The participants that won, in draw order, along with the seed that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub seed: u64,
    pub winners: Vec<Participant>,
}

/// Selects `winner_count` distinct winners from `participants` using the given randomness source.
///
/// Participants are deduplicated by order id. The function fails if there are no participants, or fewer
/// participants than winners. Every k-subset of the participants is equally likely to be chosen.
pub fn select_winners<R: Rng + ?Sized>(
    participants: &[Participant],
    winner_count: usize,
    rng: &mut R,
) -> Result<Vec<Participant>, SettlementError> {
    let mut pool = canonical_order(participants);
    if pool.is_empty() {
        return Err(SettlementError::NoParticipants(0));
    }
    if pool.len() < winner_count {
        return Err(SettlementError::InsufficientParticipants { participants: pool.len(), winners: winner_count });
    }
    pool.shuffle(rng);
    pool.truncate(winner_count);
    Ok(pool)
}

/// Runs a draw from the given seed.
pub fn seeded_draw(
    participants: &[Participant],
    winner_count: usize,
    seed: u64,
) -> Result<DrawOutcome, SettlementError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let winners = select_winners(participants, winner_count, &mut rng)?;
    Ok(DrawOutcome { seed, winners })
}

/// Runs a draw from a fresh seed taken from the thread-local generator.
pub fn random_draw(participants: &[Participant], winner_count: usize) -> Result<DrawOutcome, SettlementError> {
    let seed = new_seed();
    seeded_draw(participants, winner_count, seed)
}

/// Re-derives the winners of a recorded draw. The result is identical to the original draw provided the
/// participants are the same set, in any order.
pub fn replay_draw(
    participants: &[Participant],
    winner_count: usize,
    seed: u64,
) -> Result<Vec<Participant>, SettlementError> {
    seeded_draw(participants, winner_count, seed).map(|o| o.winners)
}

pub fn new_seed() -> u64 {
    thread_rng().gen()
}

fn canonical_order(participants: &[Participant]) -> Vec<Participant> {
    let mut pool = participants.to_vec();
    pool.sort_by_key(|p| p.order_id);
    pool.dedup_by_key(|p| p.order_id);
    pool
}
