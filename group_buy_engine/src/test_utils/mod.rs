//! Helpers for tests that need a real database: throwaway SQLite files and seeded group buys.
pub mod fixtures;
pub mod prepare_env;
