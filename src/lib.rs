//! Leave management service: request lifecycle, balance ledger, holiday
//! calendar and real-time notification fan-out behind a JWT-guarded REST API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod leave;
pub mod model;
pub mod models;
pub mod notify;
pub mod routes;
pub mod utils;
