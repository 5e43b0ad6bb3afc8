//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database, so long-running work such
//! as a draw waiting on its group lock never blocks a worker.
//!
//! Authorisation is not handled here. The `requesting_user_id` of a draw request is logged, nothing more.
use actix_web::{get, web, HttpResponse, Responder};
use group_buy_engine::{
    traits::{LedgerManagement, SettlementQueries},
    DividendApi,
    GroupBuyApi,
    JoinRequest,
    ResultsApi,
    SettlementApi,
};
use log::*;

use crate::{
    data_objects::{DrawRequest, JoinGroupRequest, JoinResponse, OpenGroupRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Groups  ----------------------------------------------------
route!(open_group => Post "/groups" impl LedgerManagement);
/// Opens a new group buy. The group starts out `Forming` with no members.
pub async fn open_group<B: LedgerManagement>(
    body: web::Json<OpenGroupRequest>,
    api: web::Data<GroupBuyApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST open group [{}] for product {}", req.group_code, req.product_id);
    let group = api.open_group(req.into()).await?;
    Ok(HttpResponse::Created().json(group))
}

route!(group_by_id => Get "/groups/{id}" impl LedgerManagement);
pub async fn group_by_id<B: LedgerManagement>(
    path: web::Path<i64>,
    api: web::Data<GroupBuyApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_id = path.into_inner();
    trace!("💻️ GET group {group_id}");
    let group = api.group(group_id).await?;
    Ok(HttpResponse::Ok().json(group))
}

route!(join_group => Post "/groups/{id}/join" impl LedgerManagement);
/// Route handler for join events.
///
/// If this join fills the group and automatic draws are on, the draw runs before the response is sent and its result
/// is included in the response.
pub async fn join_group<B: LedgerManagement>(
    path: web::Path<i64>,
    body: web::Json<JoinGroupRequest>,
    api: web::Data<GroupBuyApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_id = path.into_inner();
    let JoinGroupRequest { order_id, user_id } = body.into_inner();
    debug!("💻️ POST join group {group_id} by user {user_id} with order {order_id}");
    let result = api.join_group(JoinRequest::new(group_id, order_id, user_id)).await?;
    Ok(HttpResponse::Ok().json(JoinResponse::from(result)))
}

route!(draw_group => Post "/groups/{id}/draw" impl LedgerManagement);
/// Route handler for draw triggers.
///
/// A group that was already drawn answers `409 Conflict`, with the original result in the `result` field of the body.
pub async fn draw_group<B: LedgerManagement>(
    path: web::Path<i64>,
    body: Option<web::Json<DrawRequest>>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_id = path.into_inner();
    let req = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ POST draw for group {group_id}");
    let result = api.draw(group_id, req.requesting_user_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(group_result => Get "/groups/{id}/result" impl SettlementQueries);
pub async fn group_result<B: SettlementQueries>(
    path: web::Path<i64>,
    api: web::Data<ResultsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_id = path.into_inner();
    trace!("💻️ GET result for group {group_id}");
    let result = api
        .result_for_group(group_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Group {group_id} has not been drawn")))?;
    Ok(HttpResponse::Ok().json(result))
}

route!(verify_group_draw => Get "/groups/{id}/verify" impl SettlementQueries);
/// Re-runs a group's draw from its recorded seed and reports whether it selects the same winners.
pub async fn verify_group_draw<B: SettlementQueries>(
    path: web::Path<i64>,
    api: web::Data<ResultsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_id = path.into_inner();
    trace!("💻️ GET draw audit for group {group_id}");
    let audit = api.verify_draw(group_id).await?;
    if !audit.is_consistent() {
        warn!("💻️ The replayed draw for group {group_id} does not match the recorded winners");
    }
    Ok(HttpResponse::Ok().json(audit))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(winning_records => Get "/users/{id}/wins" impl SettlementQueries);
pub async fn winning_records<B: SettlementQueries>(
    path: web::Path<i64>,
    api: web::Data<ResultsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ GET winning records for user {user_id}");
    let records = api.winning_records(user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}

route!(dividend_records => Get "/users/{id}/dividends" impl SettlementQueries);
pub async fn dividend_records<B: SettlementQueries>(
    path: web::Path<i64>,
    api: web::Data<ResultsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ GET dividend records for user {user_id}");
    let records = api.dividend_records(user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}

//----------------------------------------------   Dividends  ----------------------------------------------------
route!(pay_lottery_dividends => Post "/lotteries/{id}/pay_dividends" impl LedgerManagement);
/// Pays every pending dividend of a lottery. Dividends that were paid earlier are skipped, so the call can be
/// repeated safely.
pub async fn pay_lottery_dividends<B: LedgerManagement>(
    path: web::Path<i64>,
    api: web::Data<DividendApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let lottery_id = path.into_inner();
    debug!("💻️ POST pay dividends for lottery {lottery_id}");
    let paid = api.pay_dividends_for_lottery(lottery_id).await?;
    let dividends = paid.into_iter().map(|(dividend, _)| dividend).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(dividends))
}

route!(pay_dividend => Post "/dividends/{id}/pay" impl LedgerManagement);
pub async fn pay_dividend<B: LedgerManagement>(
    path: web::Path<i64>,
    api: web::Data<DividendApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let dividend_id = path.into_inner();
    debug!("💻️ POST pay dividend {dividend_id}");
    let (dividend, _account) = api.pay_dividend(dividend_id).await?;
    Ok(HttpResponse::Ok().json(dividend))
}
