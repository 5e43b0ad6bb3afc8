//! # Settlement logic
//!
//! The pure parts of the settlement engine. Nothing in here touches the database.
//!
//! * [`tracker`] decides whether a join is allowed, how it moves the group's counters, and when a group may be drawn.
//! * [`draw`] selects the winners with a seeded, unbiased shuffle.
//! * [`dividends`] splits the dividend pool between the participants that did not win.
//!
//! The [`SettlementApi`](crate::SettlementApi) orchestrator strings these together and hands the result to the ledger.
pub mod dividends;
pub mod draw;
mod errors;
pub mod tracker;

pub use dividends::{compute_dividends, pool_amount, DividendAllocation, RoundingPolicy};
pub use draw::{random_draw, replay_draw, seeded_draw, select_winners, DrawOutcome};
pub use errors::SettlementError;
pub use tracker::{apply_join, check_ready_for_draw, validate_join, JoinContext, JoinProgress, JoinRejection};
