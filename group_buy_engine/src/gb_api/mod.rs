//! # Group buy engine public API
//!
//! The `gb_api` module exposes the programmatic API of the settlement engine. It is modular, so that clients can pick
//! the parts they need.
//!
//! * [`group_buy_api`] opens group buys and records members joining them.
//! * [`settlement_api`] performs the draw for a full group and commits the result.
//! * [`dividend_api`] pays out the dividends a draw allocated.
//! * [`results_api`] provides the read-only views: group results, winning records and dividend records.
//!
//! # API usage
//!
//! Every API is created by supplying a database backend that implements the traits it needs. Backends are cheap to
//! clone.
//!
//! ```rust,ignore
//! use group_buy_engine::{events::EventProducers, GroupBuyApi, SettlementApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let settlement = SettlementApi::new(db.clone(), EventProducers::default());
//! let groups = GroupBuyApi::new(db, settlement.clone());
//! let join = groups.join_group(JoinRequest::new(group_id, order_id, user_id)).await?;
//! ```
pub mod dividend_api;
pub mod group_buy_api;
pub mod results_api;
pub mod settlement_api;
pub mod settlement_objects;
