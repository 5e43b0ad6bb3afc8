//! Group Buy Engine
//!
//! The group buy engine settles group-buy campaigns. Users pool their orders into a group; when the group reaches its
//! member quota, a one-time lottery picks the winners that receive the product, and every other paid participant is
//! owed a cash dividend out of the pooled order value.
//!
//! The library is divided into these sections:
//! 1. The ledger ([`mod@traits`] and [`mod@sqlite`]). All reads and writes of groups, orders, draws, dividends and
//!    balances go through the [`LedgerManagement`] and [`SettlementQueries`] traits. [`SqliteDatabase`] is the
//!    provided backend. The data types stored in the ledger are defined in [`mod@db_types`].
//! 2. The settlement logic ([`mod@settlement`]). Join validation, the draw and the dividend calculation, as pure
//!    functions.
//! 3. The public API ([`mod@gb_api`]). [`GroupBuyApi`], [`SettlementApi`], [`DividendApi`] and [`ResultsApi`] combine
//!    the two into the operations callers actually use.
//!
//! The engine also emits events when a group is settled or a dividend is paid. See [`mod@events`].
pub mod db_types;
pub mod events;
pub mod gb_api;
pub mod settlement;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use gb_api::{
    dividend_api::DividendApi,
    group_buy_api::{GroupBuyApi, JoinResult},
    results_api::ResultsApi,
    settlement_api::{SettlementApi, SettlementConfig},
    settlement_objects,
};
pub use settlement::{RoundingPolicy, SettlementError};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{JoinOutcome, JoinRequest, LedgerError, LedgerManagement, SettlementPlan, SettlementQueries};
