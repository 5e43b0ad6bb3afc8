//! # Group buy server
//! This crate hosts the HTTP interface of the group buy settlement engine. It is responsible for:
//! Accepting group buy, join and draw requests and passing them to the engine.
//! Serving settlement results, winning records and dividend records.
//! Paying out dividends.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /groups`: Opens a group buy.
//! * `GET /groups/{id}`: Fetches a group buy.
//! * `POST /groups/{id}/join`: Records a join event, `{order_id, user_id}`.
//! * `POST /groups/{id}/draw`: Draws a full group, `{requesting_user_id}`.
//! * `GET /groups/{id}/result`: The settlement result of a drawn group.
//! * `GET /groups/{id}/verify`: Replays a group's draw from its recorded seed.
//! * `GET /users/{id}/wins`: A user's winning records.
//! * `GET /users/{id}/dividends`: A user's dividend records.
//! * `POST /lotteries/{id}/pay_dividends`: Pays every pending dividend of a lottery.
//! * `POST /dividends/{id}/pay`: Pays a single dividend.
//!
//! Errors are returned as `{"error": kind, "message": text}`.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
