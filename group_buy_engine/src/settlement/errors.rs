use thiserror::Error;

use crate::{gb_api::settlement_objects::SettlementResult, traits::LedgerError};

/// The caller-visible failures of the settlement engine.
///
/// All of them are recoverable. A failed draw leaves no partial state behind, so every variant can be retried once
/// its cause is resolved. [`SettlementError::kind`] gives a stable machine-readable tag for each variant.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Group buy {0} does not exist")]
    GroupNotFound(i64),
    #[error("Cannot join the group buy. {0}")]
    GroupNotJoinable(String),
    #[error("Cannot open the group buy. {0}")]
    InvalidGroup(String),
    #[error("User account {0} does not exist")]
    AccountNotFound(i64),
    #[error("Group buy {group_id} has {current_members} of {group_size} members and is not ready for a draw")]
    GroupNotReady { group_id: i64, current_members: i64, group_size: i64 },
    #[error("Group buy {} has already been drawn", .0.group_id())]
    AlreadySettled(Box<SettlementResult>),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {product_id} has an invalid settlement configuration. {reason}")]
    InvalidProductConfig { product_id: i64, reason: String },
    #[error("Group buy {0} has no paid participants")]
    NoParticipants(i64),
    #[error("Cannot draw {winners} winners from {participants} paid participants")]
    InsufficientParticipants { participants: usize, winners: usize },
    #[error("All {participants} participants won. There is no one left to receive a dividend")]
    NoDividendRecipients { participants: usize },
    #[error("Dividend {0} does not exist")]
    DividendNotFound(i64),
    #[error("Lottery {0} does not exist")]
    LotteryNotFound(i64),
    #[error("Dividend {0} has already been paid")]
    DividendAlreadyPaid(i64),
    #[error("Could not persist the settlement. {0}")]
    PersistenceFailure(String),
}

impl SettlementError {
    /// A stable tag identifying the kind of failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GroupNotFound(_) => "GroupNotFound",
            Self::GroupNotJoinable(_) => "GroupNotJoinable",
            Self::InvalidGroup(_) => "InvalidGroup",
            Self::AccountNotFound(_) => "AccountNotFound",
            Self::GroupNotReady { .. } => "GroupNotReady",
            Self::AlreadySettled(_) => "AlreadySettled",
            Self::ProductNotFound(_) => "ProductNotFound",
            Self::InvalidProductConfig { .. } => "InvalidProductConfig",
            Self::NoParticipants(_) => "NoParticipants",
            Self::InsufficientParticipants { .. } => "InsufficientParticipants",
            Self::NoDividendRecipients { .. } => "NoDividendRecipients",
            Self::DividendNotFound(_) => "DividendNotFound",
            Self::LotteryNotFound(_) => "LotteryNotFound",
            Self::DividendAlreadyPaid(_) => "DividendAlreadyPaid",
            Self::PersistenceFailure(_) => "PersistenceFailure",
        }
    }

    /// The prior result, if this error reports a draw that was already performed.
    pub fn prior_result(&self) -> Option<&SettlementResult> {
        match self {
            Self::AlreadySettled(result) => Some(result),
            _ => None,
        }
    }
}

impl From<LedgerError> for SettlementError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::GroupNotFound(id) => Self::GroupNotFound(id),
            LedgerError::GroupNotJoinable(reason) => Self::GroupNotJoinable(reason),
            LedgerError::OrderNotFound(id) => Self::GroupNotJoinable(format!("Order {id} does not exist")),
            LedgerError::AccountNotFound(id) => Self::AccountNotFound(id),
            LedgerError::InvalidGroup(reason) => Self::InvalidGroup(reason),
            LedgerError::DividendNotFound(id) => Self::DividendNotFound(id),
            LedgerError::LotteryNotFound(id) => Self::LotteryNotFound(id),
            LedgerError::DividendAlreadyPaid(id) => Self::DividendAlreadyPaid(id),
            // The orchestrator resolves these two itself. Reaching here means the conflict could not be resolved.
            e @ (LedgerError::AlreadySettled(_) | LedgerError::StaleSnapshot(_)) => {
                Self::PersistenceFailure(e.to_string())
            },
            LedgerError::DatabaseError(e) => Self::PersistenceFailure(e),
        }
    }
}
