use std::collections::HashMap;

use cucumber::World;
use group_buy_engine::{
    db_types::{GroupBuying, ProductConfig, UserAccount},
    events::EventProducers,
    settlement_objects::SettlementResult,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    DividendApi,
    GroupBuyApi,
    ResultsApi,
    SettlementApi,
    SettlementError,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct GroupBuyWorld {
    pub system: Option<SettlementSystem>,
    pub products: HashMap<String, ProductConfig>,
    pub groups: HashMap<String, GroupBuying>,
    pub users: Vec<UserAccount>,
    /// Every draw attempted in the scenario, in order
    pub draws: Vec<Result<SettlementResult, SettlementError>>,
}

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub groups: GroupBuyApi<SqliteDatabase>,
    pub settlement: SettlementApi<SqliteDatabase>,
    pub dividends: DividendApi<SqliteDatabase>,
    pub results: ResultsApi<SqliteDatabase>,
}

impl GroupBuyWorld {
    pub fn system(&self) -> &SettlementSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn product(&self, name: &str) -> &ProductConfig {
        self.products.get(name).unwrap_or_else(|| panic!("No product named {name}"))
    }

    pub fn group(&self, code: &str) -> &GroupBuying {
        self.groups.get(code).unwrap_or_else(|| panic!("No group named {code}"))
    }

    pub fn last_draw(&self) -> &Result<SettlementResult, SettlementError> {
        self.draws.last().expect("No draw has been performed")
    }

    pub fn last_settlement(&self) -> &SettlementResult {
        match self.last_draw() {
            Ok(result) => result,
            Err(e) => panic!("The last draw failed: {e}"),
        }
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let producers = EventProducers::default();
        let settlement = SettlementApi::new(db.clone(), producers.clone());
        let groups = GroupBuyApi::new(db.clone(), settlement.clone()).with_auto_draw(false);
        let dividends = DividendApi::new(db.clone(), producers);
        let results = ResultsApi::new(db.clone());
        Self { db_path: url, db, groups, settlement, dividends, results }
    }
}
