use actix_web::{http::StatusCode, web, web::ServiceConfig};
use group_buy_engine::{
    db_types::{GroupStatus, ProductConfig},
    events::EventProducers,
    settlement_objects::{DrawAudit, WinningRecord},
    traits::LedgerError,
    ResultsApi,
    SettlementApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, group, json, participants, post_request, product, result_from_plan, settled_result},
    mocks::MockLedger,
};
use crate::routes::{DrawGroupRoute, GroupResultRoute, VerifyGroupDrawRoute, WinningRecordsRoute};

fn configure_draws(cfg: &mut ServiceConfig, ledger: MockLedger) {
    let api = SettlementApi::new(ledger, EventProducers::default());
    cfg.service(DrawGroupRoute::<MockLedger>::new()).app_data(web::Data::new(api));
}

fn configure_results(cfg: &mut ServiceConfig, ledger: MockLedger) {
    let api = ResultsApi::new(ledger);
    cfg.service(GroupResultRoute::<MockLedger>::new())
        .service(VerifyGroupDrawRoute::<MockLedger>::new())
        .service(WinningRecordsRoute::<MockLedger>::new())
        .app_data(web::Data::new(api));
}

/// A full, undrawn group of four for the given product and participants.
fn ready_group(product: ProductConfig, paid: i64) -> MockLedger {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Active, 4, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|_| Ok(None));
    ledger.expect_fetch_product_config().returning(move |_| Ok(Some(product.clone())));
    ledger.expect_fetch_paid_participants().returning(move |_| Ok(participants(paid)));
    ledger
}

#[actix_web::test]
async fn draw_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = ready_group(product(), 4);
    ledger.expect_commit_settlement().times(1).returning(|plan| Ok(result_from_plan(&plan)));
    let body = json!({"requesting_user_id": 1});
    let (status, body) = post_request("/groups/3/draw", Some(body), |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["lottery"]["group_id"], 3);
    assert_eq!(body["lottery"]["pool_amount"], 40000);
    assert_eq!(body["lottery"]["participant_count"], 4);
    let winner = body["winners"][0]["user_id"].as_i64().unwrap();
    let dividends = body["dividends"].as_array().unwrap();
    assert_eq!(dividends.len(), 3);
    assert!(dividends.iter().all(|d| d["amount"] == 667 && d["user_id"].as_i64() != Some(winner)));
}

#[actix_web::test]
async fn draw_without_a_body() {
    let _ = env_logger::try_init().ok();
    let mut ledger = ready_group(product(), 4);
    ledger.expect_commit_settlement().times(1).returning(|plan| Ok(result_from_plan(&plan)));
    let (status, _) = post_request("/groups/3/draw", None, |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn draw_that_fails_to_commit() {
    let _ = env_logger::try_init().ok();
    let mut ledger = ready_group(product(), 4);
    ledger
        .expect_commit_settlement()
        .times(1)
        .returning(|_| Err(LedgerError::DatabaseError("database is locked".into())));
    let (status, body) = post_request("/groups/3/draw", None, |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["error"], "PersistenceFailure");
    assert!(body["message"].as_str().unwrap().contains("database is locked"));
}

#[actix_web::test]
async fn draw_settled_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Settled, 4, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|id| Ok(Some(settled_result(id))));
    ledger.expect_commit_settlement().never();
    let (status, body) = post_request("/groups/3/draw", Some(json!({})), |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body = json(&body);
    assert_eq!(body["error"], "AlreadySettled");
    assert_eq!(body["message"], "Group buy 3 has already been drawn");
    assert_eq!(body["result"]["lottery"]["id"], 7);
    assert_eq!(body["result"]["winners"][0]["user_id"], settled_result(3).winners[0].user_id);
    assert_eq!(body["result"]["dividend_count"], 3);
}

#[actix_web::test]
async fn draw_group_that_is_not_full() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Forming, 2, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|_| Ok(None));
    ledger.expect_fetch_product_config().returning(|_| Ok(Some(product())));
    ledger.expect_fetch_paid_participants().never();
    let (status, body) = post_request("/groups/3/draw", Some(json!({})), |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        r#"{"error":"GroupNotReady","message":"Group buy 3 has 2 of 4 members and is not ready for a draw"}"#
    );
}

#[actix_web::test]
async fn draw_with_too_few_paid_orders() {
    let _ = env_logger::try_init().ok();
    let mut two_winners = product();
    two_winners.winner_count = 2;
    let mut ledger = ready_group(two_winners, 1);
    ledger.expect_commit_settlement().never();
    let (status, body) = post_request("/groups/3/draw", Some(json!({})), |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&body)["error"], "InsufficientParticipants");
}

#[actix_web::test]
async fn draw_where_everyone_wins() {
    let _ = env_logger::try_init().ok();
    let mut four_winners = product();
    four_winners.winner_count = 4;
    let mut ledger = ready_group(four_winners, 4);
    ledger.expect_commit_settlement().never();
    let (status, body) = post_request("/groups/3/draw", Some(json!({})), |cfg| configure_draws(cfg, ledger)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&body)["error"], "NoDividendRecipients");
}

#[actix_web::test]
async fn group_result() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Settled, 4, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|id| Ok(Some(settled_result(id))));
    let (status, body) = get_request("/groups/3/result", |cfg| configure_results(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["lottery"]["draw_seed"], 42);
    assert_eq!(body["dividends"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn result_of_undrawn_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Active, 4, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|_| Ok(None));
    let (status, body) = get_request("/groups/3/result", |cfg| configure_results(cfg, ledger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"NoRecordFound","message":"The data was not found. Group 3 has not been drawn"}"#);
}

#[actix_web::test]
async fn winning_records() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_winning_records_for_user().returning(|_| {
        Ok(vec![WinningRecord {
            lottery_id: 7,
            group_id: 3,
            group_code: "GRP-3".into(),
            product_id: 1,
            order_id: 101,
            drawn_at: super::helpers::timestamp(),
        }])
    });
    let (status, body) = get_request("/users/11/wins", |cfg| configure_results(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"[{"lottery_id":7,"group_id":3,"group_code":"GRP-3","product_id":1,"order_id":101,"drawn_at":"2024-06-10T09:00:00Z"}]"#
    );
}

#[actix_web::test]
async fn verify_recorded_draw() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Settled, 4, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|id| Ok(Some(settled_result(id))));
    let (status, body) = get_request("/groups/3/verify", |cfg| configure_results(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let audit: DrawAudit = serde_json::from_str(&body).unwrap();
    assert_eq!(audit.lottery_id, 7);
    assert_eq!(audit.seed, 42);
    assert_eq!(audit.recorded, vec![settled_result(3).winners[0].order_id]);
    assert!(audit.is_consistent(), "{audit:?}");
}

#[actix_web::test]
async fn verify_draw_with_altered_winners() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Settled, 4, 4))));
    ledger.expect_fetch_settlement_for_group().returning(|id| {
        // Swap the winner with a dividend recipient. The population is unchanged, the recorded winner is not.
        let mut result = settled_result(id);
        let winner = &mut result.winners[0];
        let recipient = &mut result.dividends[0];
        std::mem::swap(&mut winner.order_id, &mut recipient.order_id);
        std::mem::swap(&mut winner.user_id, &mut recipient.user_id);
        Ok(Some(result))
    });
    let (status, body) = get_request("/groups/3/verify", |cfg| configure_results(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let audit: DrawAudit = serde_json::from_str(&body).unwrap();
    assert!(!audit.is_consistent());
    assert_eq!(audit.replayed, vec![settled_result(3).winners[0].order_id]);
    assert_ne!(audit.recorded, audit.replayed);
}
