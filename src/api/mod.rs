//! HTTP API server

pub mod auth;
pub mod contacts;
pub mod extract;
pub mod ratelimit;
pub mod routes;
pub mod server;
pub mod users;

pub use server::*;
