//! SQLite backend for the settlement engine.
//!
//! [`SqliteDatabase`] implements the ledger traits on top of the low-level query functions in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
