use group_buy_engine::{
    db_types::{Dividend, GroupBuying, NewGroupBuying, Participant, ProductConfig, UserAccount},
    settlement_objects::{SettlementResult, WinningRecord},
    traits::{JoinOutcome, JoinRequest, LedgerError, LedgerManagement, SettlementPlan, SettlementQueries},
};
use mockall::mock;

mock! {
    pub Ledger {}
    impl SettlementQueries for Ledger {
        async fn fetch_group(&self, group_id: i64) -> Result<Option<GroupBuying>, LedgerError>;
        async fn fetch_product_config(&self, product_id: i64) -> Result<Option<ProductConfig>, LedgerError>;
        async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, LedgerError>;
        async fn fetch_settlement_for_group(&self, group_id: i64) -> Result<Option<SettlementResult>, LedgerError>;
        async fn fetch_winning_records_for_user(&self, user_id: i64) -> Result<Vec<WinningRecord>, LedgerError>;
        async fn fetch_dividends_for_user(&self, user_id: i64) -> Result<Vec<Dividend>, LedgerError>;
    }
    impl LedgerManagement for Ledger {
        fn url(&self) -> &str;
        async fn open_group(&self, group: NewGroupBuying) -> Result<GroupBuying, LedgerError>;
        async fn record_join(&self, join: JoinRequest) -> Result<JoinOutcome, LedgerError>;
        async fn fetch_paid_participants(&self, group_id: i64) -> Result<Vec<Participant>, LedgerError>;
        async fn commit_settlement(&self, plan: SettlementPlan) -> Result<SettlementResult, LedgerError>;
        async fn pay_dividend(&self, dividend_id: i64) -> Result<(Dividend, UserAccount), LedgerError>;
        async fn pay_pending_dividends(&self, lottery_id: i64) -> Result<Vec<(Dividend, UserAccount)>, LedgerError>;
    }
}
