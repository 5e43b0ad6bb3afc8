use actix_web::{http::StatusCode, web, web::ServiceConfig};
use gb_common::Money;
use group_buy_engine::{
    db_types::DividendStatus,
    events::EventProducers,
    traits::LedgerError,
    DividendApi,
    ResultsApi,
};

use super::{
    helpers::{account, dividend, get_request, json, post_request},
    mocks::MockLedger,
};
use crate::routes::{DividendRecordsRoute, PayDividendRoute, PayLotteryDividendsRoute};

fn configure_dividends(cfg: &mut ServiceConfig, ledger: MockLedger) {
    let api = DividendApi::new(ledger, EventProducers::default());
    cfg.service(PayDividendRoute::<MockLedger>::new())
        .service(PayLotteryDividendsRoute::<MockLedger>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn pay_dividend() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_pay_dividend()
        .times(1)
        .returning(|id| Ok((dividend(id, DividendStatus::Paid), account(12, Money::from(667)))));
    let (status, body) = post_request("/dividends/1/pay", None, |cfg| configure_dividends(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["id"], 1);
    assert_eq!(body["status"], "Paid");
    assert_eq!(body["amount"], 667);
}

#[actix_web::test]
async fn pay_dividend_twice() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_pay_dividend().returning(|id| Err(LedgerError::DividendAlreadyPaid(id)));
    let (status, body) = post_request("/dividends/1/pay", None, |cfg| configure_dividends(cfg, ledger)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"DividendAlreadyPaid","message":"Dividend 1 has already been paid"}"#);
}

#[actix_web::test]
async fn pay_missing_dividend() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_pay_dividend().returning(|id| Err(LedgerError::DividendNotFound(id)));
    let (status, body) = post_request("/dividends/8/pay", None, |cfg| configure_dividends(cfg, ledger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "DividendNotFound");
}

#[actix_web::test]
async fn pay_lottery_dividends() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_pay_pending_dividends().returning(|_| {
        Ok((1..=3).map(|id| (dividend(id, DividendStatus::Paid), account(11 + id, Money::from(667)))).collect())
    });
    let (status, body) =
        post_request("/lotteries/7/pay_dividends", None, |cfg| configure_dividends(cfg, ledger)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let paid = body.as_array().unwrap();
    assert_eq!(paid.len(), 3);
    assert!(paid.iter().all(|d| d["status"] == "Paid"));
}

#[actix_web::test]
async fn pay_dividends_for_missing_lottery() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_pay_pending_dividends().returning(|id| Err(LedgerError::LotteryNotFound(id)));
    let (status, body) =
        post_request("/lotteries/70/pay_dividends", None, |cfg| configure_dividends(cfg, ledger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"LotteryNotFound","message":"Lottery 70 does not exist"}"#);
}

#[actix_web::test]
async fn dividend_records() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_dividends_for_user()
        .returning(|_| Ok(vec![dividend(2, DividendStatus::Paid), dividend(1, DividendStatus::Pending)]));
    let api = ResultsApi::new(ledger);
    let (status, body) = get_request("/users/12/dividends", |cfg| {
        cfg.service(DividendRecordsRoute::<MockLedger>::new()).app_data(web::Data::new(api));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body[0]["id"], 2);
    assert_eq!(body[1]["status"], "Pending");
    assert!(body[1]["paid_at"].is_null());
}
