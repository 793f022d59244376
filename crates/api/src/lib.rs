//! HTTP boundary: server wiring, bearer-token middleware, login and profile endpoints.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
