//! # Ledger access contracts
//!
//! This module provides the interfaces that define the contracts of the settlement engine's database *backends*.
//!
//! The settlement components never touch storage directly. They are handed a value implementing these traits and use
//! nothing else, which keeps all persistence behind one writer.
//!
//! * [`LedgerManagement`] is the write side: opening groups, recording joins, committing settlements and paying
//!   dividends. Every method is atomic.
//! * [`SettlementQueries`] provides the read-only projections: groups, product configuration, settlement results,
//!   winning records and dividends.
mod data_objects;
mod ledger_management;
mod settlement_queries;

pub use data_objects::{JoinOutcome, JoinRequest, SettlementPlan};
pub use ledger_management::{is_unique_violation, LedgerError, LedgerManagement};
pub use settlement_queries::SettlementQueries;
