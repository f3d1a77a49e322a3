//! HTTP API: server, routing, session handling and access control.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod server;
pub mod session;
