use std::str::FromStr;

use cucumber::{then, when};
use group_buy_engine::{
    db_types::{DividendStatus, GroupStatus, Money, OrderStatusType},
    SettlementQueries,
};

use crate::cucumber::GroupBuyWorld;

#[when(expr = "group {string} is drawn")]
async fn draw_group(world: &mut GroupBuyWorld, code: String) {
    let group_id = world.group(&code).id;
    let result = world.system().settlement.draw(group_id, None).await;
    world.draws.push(result);
}

#[when(expr = "group {string} is drawn again")]
async fn draw_group_again(world: &mut GroupBuyWorld, code: String) {
    draw_group(world, code).await;
}

#[when("the dividends of the last draw are paid")]
async fn pay_dividends(world: &mut GroupBuyWorld) {
    let lottery_id = world.last_settlement().lottery.id;
    let paid =
        world.system().dividends.pay_dividends_for_lottery(lottery_id).await.expect("Error paying dividends");
    assert_eq!(paid.len(), world.last_settlement().dividend_count);
}

#[then(expr = "the draw succeeds with {int} winner(s)")]
async fn draw_succeeds(world: &mut GroupBuyWorld, winners: usize) {
    let result = world.last_settlement();
    assert_eq!(result.winners.len(), winners, "Wrong number of winners");
    assert_eq!(result.lottery.winner_count as usize, winners);
}

#[then(expr = "{int} dividend(s) of {word} each are allocated")]
async fn dividends_allocated(world: &mut GroupBuyWorld, count: usize, amount: String) {
    let amount = Money::from_str(&amount).expect("Invalid amount");
    let result = world.last_settlement();
    assert_eq!(result.dividend_count, count, "Wrong number of dividends");
    assert!(result.dividends.iter().all(|d| d.amount == amount), "Dividend amounts differ: {:?}", result.dividends);
    assert!(result.dividends.iter().all(|d| d.status == DividendStatus::Pending));
}

#[then(expr = "the dividends total {word}")]
async fn dividends_total(world: &mut GroupBuyWorld, total: String) {
    let total = Money::from_str(&total).expect("Invalid amount");
    assert_eq!(world.last_settlement().total_dividends(), total);
}

#[then(expr = "the lottery pool is {word}")]
async fn lottery_pool(world: &mut GroupBuyWorld, pool: String) {
    let pool = Money::from_str(&pool).expect("Invalid amount");
    assert_eq!(world.last_settlement().lottery.pool_amount, pool);
}

#[then("no winner receives a dividend")]
async fn winners_excluded(world: &mut GroupBuyWorld) {
    let result = world.last_settlement();
    let winners = result.winner_user_ids();
    assert!(result.dividends.iter().all(|d| !winners.contains(&d.user_id)), "A winner received a dividend");
}

#[then(expr = "group {string} has status {word}")]
async fn group_status(world: &mut GroupBuyWorld, code: String, status: String) {
    let expected = GroupStatus::from_str(&status).expect("Invalid group status");
    let group_id = world.group(&code).id;
    let group = world.system().groups.group(group_id).await.expect("Error fetching group");
    assert_eq!(group.status, expected);
}

#[then("the winning orders are marked Won and the rest NotWon")]
async fn order_statuses(world: &mut GroupBuyWorld) {
    let result = world.last_settlement().clone();
    let sys = world.system();
    for winner in &result.winners {
        let order = sys.db.fetch_order(winner.order_id).await.expect("Error fetching order").expect("Missing order");
        assert_eq!(order.status, OrderStatusType::Won);
    }
    for dividend in &result.dividends {
        let order = sys.db.fetch_order(dividend.order_id).await.expect("Error fetching order").expect("Missing order");
        assert_eq!(order.status, OrderStatusType::NotWon);
    }
}

#[then(expr = "the draw fails with {word}")]
async fn draw_fails(world: &mut GroupBuyWorld, kind: String) {
    match world.last_draw() {
        Ok(result) => panic!("Expected the draw to fail with {kind}, but it succeeded: {result:?}"),
        Err(e) => assert_eq!(e.kind(), kind, "Unexpected failure: {e}"),
    }
}

#[then("the failure reports the result of the first draw")]
async fn failure_reports_first_draw(world: &mut GroupBuyWorld) {
    let first = world.draws.first().expect("No draws").as_ref().expect("The first draw failed");
    let prior = world.last_draw().as_ref().err().and_then(|e| e.prior_result()).expect("No prior result reported");
    assert_eq!(prior, first);
}

#[then(expr = "every dividend recipient has a balance of {word}")]
async fn recipient_balances(world: &mut GroupBuyWorld, balance: String) {
    let balance = Money::from_str(&balance).expect("Invalid amount");
    let result = world.last_settlement().clone();
    for dividend in &result.dividends {
        let account = world
            .system()
            .db
            .fetch_user_account(dividend.user_id)
            .await
            .expect("Error fetching account")
            .expect("Missing account");
        assert_eq!(account.balance, balance, "Wrong balance for {}", account.username);
    }
}

#[then(expr = "every winner has a balance of {word}")]
async fn winner_balances(world: &mut GroupBuyWorld, balance: String) {
    let balance = Money::from_str(&balance).expect("Invalid amount");
    let result = world.last_settlement().clone();
    for winner in &result.winners {
        let account = world
            .system()
            .db
            .fetch_user_account(winner.user_id)
            .await
            .expect("Error fetching account")
            .expect("Missing account");
        assert_eq!(account.balance, balance, "Wrong balance for {}", account.username);
    }
}

#[then("paying the dividends again pays nothing")]
async fn pay_again(world: &mut GroupBuyWorld) {
    let lottery_id = world.last_settlement().lottery.id;
    let paid =
        world.system().dividends.pay_dividends_for_lottery(lottery_id).await.expect("Error paying dividends");
    assert!(paid.is_empty());
}

#[then(expr = "replaying the draw of group {string} selects the same winners")]
async fn replay_draw(world: &mut GroupBuyWorld, code: String) {
    let group_id = world.group(&code).id;
    let audit = world.system().results.verify_draw(group_id).await.expect("Error verifying draw");
    assert!(audit.is_consistent(), "Replay differs: {audit:?}");
    let recorded = world.last_settlement().winners.iter().map(|w| w.order_id).collect::<Vec<_>>();
    assert_eq!(audit.recorded, recorded);
}

#[then(expr = "the stored result of group {string} matches the first draw")]
async fn stored_result(world: &mut GroupBuyWorld, code: String) {
    let group_id = world.group(&code).id;
    let stored = world
        .system()
        .results
        .result_for_group(group_id)
        .await
        .expect("Error fetching result")
        .expect("Group has no result");
    let first = world.draws.first().expect("No draws").as_ref().expect("The first draw failed");
    assert_eq!(&stored, first);
}
