use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use group_buy_engine::{
    db_types::{GroupMember, GroupStatus},
    events::EventProducers,
    traits::{JoinOutcome, LedgerError},
    GroupBuyApi,
    SettlementApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, group, json, participants, post_request, product, result_from_plan},
    mocks::MockLedger,
};
use crate::{
    errors::json_error_handler,
    routes::{GroupByIdRoute, JoinGroupRoute, OpenGroupRoute},
};

fn configure_groups(cfg: &mut ServiceConfig, ledger: MockLedger, settlement: MockLedger, auto_draw: bool) {
    let settlement = SettlementApi::new(settlement, EventProducers::default());
    let api = GroupBuyApi::new(ledger, settlement).with_auto_draw(auto_draw);
    cfg.service(OpenGroupRoute::<MockLedger>::new())
        .service(GroupByIdRoute::<MockLedger>::new())
        .service(JoinGroupRoute::<MockLedger>::new())
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn open_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_open_group().returning(|g| {
        let mut result = group(5, GroupStatus::Forming, 0, g.group_size);
        result.group_code = g.group_code;
        result.team_id = g.team_id;
        Ok(result)
    });
    let body = json!({"group_code": "TEA-1", "product_id": 1, "leader_id": 1, "group_size": 4, "team_id": 9});
    let (status, body) =
        post_request("/groups", Some(body), |cfg| configure_groups(cfg, ledger, MockLedger::new(), true)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = json(&body);
    assert_eq!(body["id"], 5);
    assert_eq!(body["group_code"], "TEA-1");
    assert_eq!(body["team_id"], 9);
    assert_eq!(body["status"], "Forming");
}

#[actix_web::test]
async fn open_group_with_malformed_body() {
    let _ = env_logger::try_init().ok();
    let body = json!({"group_code": "TEA-1", "group_size": "four"});
    let (status, body) = post_request("/groups", Some(body), |cfg| {
        configure_groups(cfg, MockLedger::new(), MockLedger::new(), true)
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["error"], "InvalidRequestBody");
    assert!(body["message"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn open_group_for_unknown_leader() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_open_group().returning(|g| Err(LedgerError::AccountNotFound(g.leader_id)));
    let body = json!({"group_code": "TEA-1", "product_id": 1, "leader_id": 99, "group_size": 4});
    let (status, body) =
        post_request("/groups", Some(body), |cfg| configure_groups(cfg, ledger, MockLedger::new(), true)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"AccountNotFound","message":"User account 99 does not exist"}"#);
}

#[actix_web::test]
async fn fetch_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Active, 4, 4))));
    let (status, body) = get_request("/groups/3", |cfg| configure_groups(cfg, ledger, MockLedger::new(), true)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["id"], 3);
    assert_eq!(body["status"], "Active");
    assert_eq!(body["current_members"], 4);
}

#[actix_web::test]
async fn fetch_missing_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_group().returning(|_| Ok(None));
    let (status, body) = get_request("/groups/9", |cfg| configure_groups(cfg, ledger, MockLedger::new(), true)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"GroupNotFound","message":"Group buy 9 does not exist"}"#);
}

fn join_outcome(group_id: i64, members: i64, quorum_reached: bool) -> JoinOutcome {
    let status = if quorum_reached { GroupStatus::Active } else { GroupStatus::Forming };
    JoinOutcome {
        group: group(group_id, status, members, 4),
        member: GroupMember { id: members, group_id, user_id: 10 + members, order_id: 100 + members, joined_at: Utc::now() },
        quorum_reached,
    }
}

#[actix_web::test]
async fn join_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_record_join().returning(|j| Ok(join_outcome(j.group_id, 2, false)));
    let body = json!({"order_id": 102, "user_id": 12});
    let (status, body) =
        post_request("/groups/3/join", Some(body), |cfg| configure_groups(cfg, ledger, MockLedger::new(), true)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["quorum_reached"], false);
    assert_eq!(body["group"]["current_members"], 2);
    assert_eq!(body["member"]["order_id"], 102);
    assert!(body["settlement"].is_null());
}

#[actix_web::test]
async fn join_full_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_record_join().returning(|_| {
        Err(LedgerError::GroupNotJoinable("The group has no free slots".to_string()))
    });
    let body = json!({"order_id": 105, "user_id": 15});
    let (status, body) =
        post_request("/groups/3/join", Some(body), |cfg| configure_groups(cfg, ledger, MockLedger::new(), true)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "GroupNotJoinable");
}

#[actix_web::test]
async fn last_join_draws_the_group() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_record_join().returning(|j| Ok(join_outcome(j.group_id, 4, true)));
    let mut settlement = MockLedger::new();
    settlement.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Active, 4, 4))));
    settlement.expect_fetch_settlement_for_group().returning(|_| Ok(None));
    settlement.expect_fetch_product_config().returning(|_| Ok(Some(product())));
    settlement.expect_fetch_paid_participants().returning(|_| Ok(participants(4)));
    settlement.expect_commit_settlement().times(1).returning(|plan| Ok(result_from_plan(&plan)));
    let body = json!({"order_id": 104, "user_id": 14});
    let (status, body) =
        post_request("/groups/3/join", Some(body), |cfg| configure_groups(cfg, ledger, settlement, true)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["quorum_reached"], true);
    assert!(body["draw_error"].is_null());
    let settlement = &body["settlement"];
    assert_eq!(settlement["winners"].as_array().unwrap().len(), 1);
    assert_eq!(settlement["dividend_count"], 3);
    for dividend in settlement["dividends"].as_array().unwrap() {
        assert_eq!(dividend["amount"], 667);
    }
}

#[actix_web::test]
async fn failed_automatic_draw_keeps_the_join() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_record_join().returning(|j| Ok(join_outcome(j.group_id, 4, true)));
    let mut settlement = MockLedger::new();
    settlement.expect_fetch_group().returning(|id| Ok(Some(group(id, GroupStatus::Active, 4, 4))));
    settlement.expect_fetch_settlement_for_group().returning(|_| Ok(None));
    settlement.expect_fetch_product_config().returning(|_| Ok(Some(product())));
    settlement.expect_fetch_paid_participants().returning(|_| Ok(vec![]));
    settlement.expect_commit_settlement().never();
    let body = json!({"order_id": 104, "user_id": 14});
    let (status, body) =
        post_request("/groups/3/join", Some(body), |cfg| configure_groups(cfg, ledger, settlement, true)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["quorum_reached"], true);
    assert!(body["settlement"].is_null());
    assert_eq!(body["draw_error"], "Group buy 3 has no paid participants");
}
