//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. It is the only writer of the ledger tables.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, dividends, group_buys, lotteries, members, new_pool, orders, products, user_accounts};
use crate::{
    db_types::{
        Dividend,
        DividendStatus,
        GroupBuying,
        GroupMember,
        GroupStatus,
        NewGroupBuying,
        NewOrder,
        NewProduct,
        Order,
        OrderStatusType,
        Participant,
        ProductConfig,
        UserAccount,
    },
    gb_api::settlement_objects::{SettlementResult, WinningRecord},
    settlement::{apply_join, validate_join, JoinContext},
    traits::{
        is_unique_violation,
        JoinOutcome,
        JoinRequest,
        LedgerError,
        LedgerManagement,
        SettlementPlan,
        SettlementQueries,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementQueries for SqliteDatabase {
    async fn fetch_group(&self, group_id: i64) -> Result<Option<GroupBuying>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let group = group_buys::fetch_group(group_id, &mut conn).await?;
        Ok(group)
    }

    async fn fetch_product_config(&self, product_id: i64) -> Result<Option<ProductConfig>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::user_account_by_id(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_settlement_for_group(&self, group_id: i64) -> Result<Option<SettlementResult>, LedgerError> {
        // A read transaction, so that the record, winners and dividends come from the same snapshot
        let mut tx = self.pool.begin().await?;
        let result = match lotteries::fetch_drawn_record_for_group(group_id, &mut tx).await? {
            Some(record) => {
                let winners = lotteries::fetch_winner_info(record.id, &mut tx).await?;
                let dividends = dividends::fetch_dividends_for_lottery(record.id, &mut tx).await?;
                Some(SettlementResult::new(record, winners, dividends))
            },
            None => None,
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_winning_records_for_user(&self, user_id: i64) -> Result<Vec<WinningRecord>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let records = lotteries::fetch_winning_records_for_user(user_id, &mut conn).await?;
        Ok(records)
    }

    async fn fetch_dividends_for_user(&self, user_id: i64) -> Result<Vec<Dividend>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let dividends = dividends::fetch_dividends_for_user(user_id, &mut conn).await?;
        Ok(dividends)
    }
}

impl LedgerManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn open_group(&self, group: NewGroupBuying) -> Result<GroupBuying, LedgerError> {
        if group.group_size < 1 {
            return Err(LedgerError::InvalidGroup(format!("Group size must be at least 1, not {}", group.group_size)));
        }
        let mut conn = self.pool.acquire().await?;
        if products::fetch_product(group.product_id, &mut conn).await?.is_none() {
            return Err(LedgerError::InvalidGroup(format!("Product {} does not exist", group.product_id)));
        }
        if user_accounts::user_account_by_id(group.leader_id, &mut conn).await?.is_none() {
            return Err(LedgerError::AccountNotFound(group.leader_id));
        }
        let code = group.group_code.clone();
        let group = group_buys::insert_group(group, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::InvalidGroup(format!("Group code {code} is already in use"))
            } else {
                e.into()
            }
        })?;
        debug!("🗃️ Group buy {} [{}] opened for {} members", group.id, group.group_code, group.group_size);
        Ok(group)
    }

    async fn record_join(&self, join: JoinRequest) -> Result<JoinOutcome, LedgerError> {
        let JoinRequest { group_id, order_id, user_id } = join;
        let mut tx = self.pool.begin().await?;
        if !group_buys::lock_group(group_id, &mut tx).await? {
            return Err(LedgerError::GroupNotFound(group_id));
        }
        let group = group_buys::fetch_group(group_id, &mut tx).await?.ok_or(LedgerError::GroupNotFound(group_id))?;
        if user_accounts::user_account_by_id(user_id, &mut tx).await?.is_none() {
            return Err(LedgerError::AccountNotFound(user_id));
        }
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(LedgerError::OrderNotFound(order_id))?;
        let user_already_member = members::is_member(group_id, user_id, &mut tx).await?;
        let order_already_joined = members::order_is_bound(order_id, &mut tx).await?;
        let ctx = JoinContext { group: &group, order: &order, user_id, user_already_member, order_already_joined };
        validate_join(&ctx).map_err(|reason| {
            debug!("🗃️ Join of group {group_id} by user {user_id} rejected. {reason}");
            LedgerError::GroupNotJoinable(reason.to_string())
        })?;
        let member = members::insert_member(group_id, user_id, order_id, &mut tx).await.map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::GroupNotJoinable("The user or order is already part of this group".into())
            } else {
                e.into()
            }
        })?;
        let progress = apply_join(&group, Utc::now());
        let group =
            group_buys::update_progress(&group, progress.current_members, progress.status, progress.ended_at, &mut tx)
                .await?
                .ok_or_else(|| {
                    let reason = format!("Group {group_id} cannot move from {} to {}", group.status, progress.status);
                    LedgerError::GroupNotJoinable(reason)
                })?;
        tx.commit().await?;
        debug!(
            "🗃️ User {user_id} joined group {group_id} with order {order_id}. {}/{} members",
            group.current_members, group.group_size
        );
        Ok(JoinOutcome { group, member, quorum_reached: progress.quorum_reached })
    }

    async fn fetch_paid_participants(&self, group_id: i64) -> Result<Vec<Participant>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let participants = members::fetch_paid_participants(group_id, &mut conn).await?;
        Ok(participants)
    }

    async fn commit_settlement(&self, plan: SettlementPlan) -> Result<SettlementResult, LedgerError> {
        let group_id = plan.group_id;
        let mut tx = self.pool.begin().await?;
        if !group_buys::lock_group(group_id, &mut tx).await? {
            return Err(LedgerError::GroupNotFound(group_id));
        }
        let group = group_buys::fetch_group(group_id, &mut tx).await?.ok_or(LedgerError::GroupNotFound(group_id))?;
        if group.status == GroupStatus::Settled
            || lotteries::fetch_drawn_record_for_group(group_id, &mut tx).await?.is_some()
        {
            debug!("🗃️ Group {group_id} has already been drawn. Discarding the plan");
            return Err(LedgerError::AlreadySettled(group_id));
        }
        if group.status != plan.expected_status {
            warn!("🗃️ Group {group_id} is {} but the plan expected {}", group.status, plan.expected_status);
            return Err(LedgerError::StaleSnapshot(group_id));
        }
        let product = products::fetch_product(plan.product_id, &mut tx).await?;
        let product_unchanged = group.product_id == plan.product_id
            && product.is_some_and(|p| p.winner_count == plan.winner_count && p.dividend_rate == plan.dividend_rate);
        if !product_unchanged {
            warn!("🗃️ The settlement configuration of product {} changed since the plan was made", plan.product_id);
            return Err(LedgerError::StaleSnapshot(group_id));
        }
        let population = members::fetch_paid_participants(group_id, &mut tx).await?;
        if population != plan.participants {
            warn!("🗃️ The paid population of group {group_id} changed since the plan was made");
            return Err(LedgerError::StaleSnapshot(group_id));
        }
        let now = Utc::now();
        let record = lotteries::insert_drawn_record(&plan, now, &mut tx).await.map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::AlreadySettled(group_id)
            } else {
                e.into()
            }
        })?;
        lotteries::insert_winners(record.id, &plan.winners, &mut tx).await?;
        let dividends = dividends::insert_dividends(record.id, &plan.dividends, now, &mut tx).await?;
        let won = plan.winners.iter().map(|w| w.order_id).collect::<Vec<_>>();
        let not_won = plan.dividends.iter().map(|d| d.order_id).collect::<Vec<_>>();
        orders::set_status_for_orders(&won, OrderStatusType::Won, &mut tx).await?;
        orders::set_status_for_orders(&not_won, OrderStatusType::NotWon, &mut tx).await?;
        group_buys::mark_settled(&group, now, &mut tx).await?.ok_or(LedgerError::StaleSnapshot(group_id))?;
        let winners = lotteries::fetch_winner_info(record.id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "🗃️ Lottery {} for group {group_id} committed. {} winners, {} dividends totalling {}",
            record.id,
            winners.len(),
            dividends.len(),
            plan.total_dividends()
        );
        Ok(SettlementResult::new(record, winners, dividends))
    }

    async fn pay_dividend(&self, dividend_id: i64) -> Result<(Dividend, UserAccount), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let dividend = match dividends::mark_paid(dividend_id, Utc::now(), &mut tx).await? {
            Some(d) => d,
            None => {
                return match dividends::fetch_dividend(dividend_id, &mut tx).await? {
                    Some(_) => Err(LedgerError::DividendAlreadyPaid(dividend_id)),
                    None => Err(LedgerError::DividendNotFound(dividend_id)),
                };
            },
        };
        let account = user_accounts::credit_balance(dividend.user_id, dividend.amount, &mut tx)
            .await?
            .ok_or(LedgerError::AccountNotFound(dividend.user_id))?;
        tx.commit().await?;
        debug!("🗃️ Dividend {dividend_id} of {} paid to account #{}", dividend.amount, account.id);
        Ok((dividend, account))
    }

    async fn pay_pending_dividends(&self, lottery_id: i64) -> Result<Vec<(Dividend, UserAccount)>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        if !lotteries::lock_record(lottery_id, &mut tx).await? {
            return Err(LedgerError::LotteryNotFound(lottery_id));
        }
        let all = dividends::fetch_dividends_for_lottery(lottery_id, &mut tx).await?;
        let now = Utc::now();
        let mut result = Vec::with_capacity(all.len());
        for pending in all.into_iter().filter(|d| d.status == DividendStatus::Pending) {
            let Some(dividend) = dividends::mark_paid(pending.id, now, &mut tx).await? else {
                continue;
            };
            let account = user_accounts::credit_balance(dividend.user_id, dividend.amount, &mut tx)
                .await?
                .ok_or(LedgerError::AccountNotFound(dividend.user_id))?;
            result.push((dividend, account));
        }
        tx.commit().await?;
        debug!("🗃️ {} dividends of lottery {lottery_id} paid", result.len());
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    // User accounts, the product catalog and orders are owned by other services. These methods let those services,
    // and the tests, feed records into the ledger.

    pub async fn insert_user(&self, username: &str) -> Result<UserAccount, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::insert_user(username, &mut conn).await?;
        Ok(account)
    }

    pub async fn insert_product(&self, product: NewProduct) -> Result<ProductConfig, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        Ok(product)
    }

    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    pub async fn set_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order =
            orders::update_order_status(order_id, status, &mut conn).await?.ok_or(LedgerError::OrderNotFound(order_id))?;
        trace!("🗃️ Order {order_id} is now {status}");
        Ok(order)
    }

    pub async fn mark_order_paid(&self, order_id: i64) -> Result<Order, LedgerError> {
        self.set_order_status(order_id, OrderStatusType::Paid).await
    }

    pub async fn fetch_members(&self, group_id: i64) -> Result<Vec<GroupMember>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let members = members::fetch_members(group_id, &mut conn).await?;
        Ok(members)
    }
}
