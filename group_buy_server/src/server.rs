use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use group_buy_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    DividendApi,
    GroupBuyApi,
    ResultsApi,
    SettlementApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::{json_error_handler, ServerError},
    routes::{
        health,
        DividendRecordsRoute,
        DrawGroupRoute,
        GroupByIdRoute,
        GroupResultRoute,
        JoinGroupRoute,
        OpenGroupRoute,
        PayDividendRoute,
        PayLotteryDividendsRoute,
        VerifyGroupDrawRoute,
        WinningRecordsRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("🗃️ Database is ready at {}", config.database_url);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::BackendError(e.to_string()))
}

/// Settlement outcomes are written to the log. Notification services hook in here.
fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_group_settled(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Group {} settled. Winners: {:?}. {} dividends totalling {}",
                ev.result.group_id(),
                ev.result.winners.iter().map(|w| w.user_id).collect::<Vec<_>>(),
                ev.result.dividend_count,
                ev.result.total_dividends()
            );
        })
    });
    hooks.on_dividend_paid(|ev| {
        Box::pin(async move {
            info!("📬️ Dividend {} of {} paid to {}", ev.dividend.id, ev.dividend.amount, ev.account.username);
        })
    });
    hooks
}

/// The APIs are created once and shared by every worker, so that all draws go through the same per-group locks.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let settlement_api = SettlementApi::new(db.clone(), producers.clone()).with_config(config.settlement);
    let groups_api = GroupBuyApi::new(db.clone(), settlement_api.clone()).with_auto_draw(config.auto_draw_on_quorum);
    let settlement_api = web::Data::new(settlement_api);
    let groups_api = web::Data::new(groups_api);
    let dividends_api = web::Data::new(DividendApi::new(db.clone(), producers));
    let results_api = web::Data::new(ResultsApi::new(db));
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("gb::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(settlement_api.clone())
            .app_data(groups_api.clone())
            .app_data(dividends_api.clone())
            .app_data(results_api.clone())
            .service(health)
            .service(OpenGroupRoute::<SqliteDatabase>::new())
            .service(GroupByIdRoute::<SqliteDatabase>::new())
            .service(JoinGroupRoute::<SqliteDatabase>::new())
            .service(DrawGroupRoute::<SqliteDatabase>::new())
            .service(GroupResultRoute::<SqliteDatabase>::new())
            .service(VerifyGroupDrawRoute::<SqliteDatabase>::new())
            .service(WinningRecordsRoute::<SqliteDatabase>::new())
            .service(DividendRecordsRoute::<SqliteDatabase>::new())
            .service(PayLotteryDividendsRoute::<SqliteDatabase>::new())
            .service(PayDividendRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
