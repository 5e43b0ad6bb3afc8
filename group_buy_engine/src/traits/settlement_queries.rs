use crate::{
    db_types::{Dividend, GroupBuying, ProductConfig, UserAccount},
    gb_api::settlement_objects::{SettlementResult, WinningRecord},
    traits::LedgerError,
};

/// The `SettlementQueries` trait defines the read-only projections over groups, draws and dividends.
///
/// None of these methods mutate state. They back the "result for group", "my winning records" and
/// "my dividend records" queries, and the look-ups the settlement orchestrator performs before it plans a draw.
#[allow(async_fn_in_trait)]
pub trait SettlementQueries {
    /// Fetches the group buy with the given id. If no group exists, `None` is returned.
    async fn fetch_group(&self, group_id: i64) -> Result<Option<GroupBuying>, LedgerError>;

    /// Fetches the settlement configuration for a product. If the catalog has no such product, `None` is returned.
    async fn fetch_product_config(&self, product_id: i64) -> Result<Option<ProductConfig>, LedgerError>;

    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, LedgerError>;

    /// Fetches the complete settlement (lottery record, resolved winners and dividends) for the group, if the group
    /// has been drawn.
    async fn fetch_settlement_for_group(&self, group_id: i64) -> Result<Option<SettlementResult>, LedgerError>;

    /// All the draws the user has won, most recent first.
    async fn fetch_winning_records_for_user(&self, user_id: i64) -> Result<Vec<WinningRecord>, LedgerError>;

    /// All the dividends allocated to the user, most recent first.
    async fn fetch_dividends_for_user(&self, user_id: i64) -> Result<Vec<Dividend>, LedgerError>;
}
