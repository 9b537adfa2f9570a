//! Contacts API - contacts REST service with JWT auth and a session cache
//!
//! This is the library interface, used by the `contacts-api` binary and by
//! the integration tests to run the service against in-memory backends.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod db;
pub mod error;
pub mod mail;
pub mod upload;

pub use config::Config;
pub use error::Error;
