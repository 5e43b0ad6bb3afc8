use thiserror::Error;

use crate::{
    db_types::{Dividend, GroupBuying, NewGroupBuying, Participant, UserAccount},
    gb_api::settlement_objects::SettlementResult,
    traits::{
        data_objects::{JoinOutcome, JoinRequest, SettlementPlan},
        SettlementQueries,
    },
};

/// This trait is the ledger accessor of the settlement engine: the only path through which groups, orders, draws,
/// dividends and balances are written.
///
/// Every mutating method is a single atomic unit against the backing store. Either all of its writes become visible,
/// or none do.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement: SettlementQueries {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a new group buy in `Forming` status with no members.
    async fn open_group(&self, group: NewGroupBuying) -> Result<GroupBuying, LedgerError>;

    /// Records a join event in a single atomic transaction:
    /// * the group is checked to be joinable (status, capacity, duplicate user, order ownership and product),
    /// * the membership row binding the order to the group is inserted,
    /// * `current_members` is incremented, and if the quota is now reached, the group becomes `Active`.
    ///
    /// A rejected join leaves no trace.
    async fn record_join(&self, join: JoinRequest) -> Result<JoinOutcome, LedgerError>;

    /// Fetches the paid orders bound to the group. These form the population of the group's draw.
    ///
    /// The result is ordered by order id.
    async fn fetch_paid_participants(&self, group_id: i64) -> Result<Vec<Participant>, LedgerError>;

    /// Commits a settlement plan in a single atomic transaction:
    /// * re-reads the group and the paid population, failing with [`LedgerError::StaleSnapshot`] if either no longer
    ///   matches the plan,
    /// * inserts the lottery record (status `Drawn`), the winners and the pending dividends,
    /// * marks winning orders `Won` and the others `NotWon`,
    /// * moves the group to `Settled` and stamps its success time.
    ///
    /// If the group has already been drawn, [`LedgerError::AlreadySettled`] is returned and nothing is written.
    async fn commit_settlement(&self, plan: SettlementPlan) -> Result<SettlementResult, LedgerError>;

    /// Marks a pending dividend as paid and credits the amount to the user's balance, atomically.
    async fn pay_dividend(&self, dividend_id: i64) -> Result<(Dividend, UserAccount), LedgerError>;

    /// Pays every pending dividend of a lottery in one transaction. Dividends that were already paid are skipped.
    async fn pay_pending_dividends(&self, lottery_id: i64) -> Result<Vec<(Dividend, UserAccount)>, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested group buy {0} does not exist")]
    GroupNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The requested user account {0} does not exist")]
    AccountNotFound(i64),
    #[error("The requested dividend {0} does not exist")]
    DividendNotFound(i64),
    #[error("The requested lottery {0} does not exist")]
    LotteryNotFound(i64),
    #[error("Cannot join the group buy. {0}")]
    GroupNotJoinable(String),
    #[error("Cannot open the group buy. {0}")]
    InvalidGroup(String),
    #[error("Group buy {0} has already been drawn")]
    AlreadySettled(i64),
    #[error("The settlement plan for group buy {0} no longer matches the stored state")]
    StaleSnapshot(i64),
    #[error("Dividend {0} has already been paid")]
    DividendAlreadyPaid(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// True if the error is a uniqueness constraint failure reported by the database.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
