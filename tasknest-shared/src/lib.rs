//! # TaskNest Shared Library
//!
//! Domain types, persistence and business operations behind the TaskNest API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks and their request/patch types
//! - `auth`: Password hashing, bearer tokens and request identity
//! - `store`: Persistence trait with PostgreSQL and in-memory implementations
//! - `db`: Connection pool and migrations
//! - `services`: Account and task operations
//! - `notify`: Welcome and goodbye mail
//! - `avatar`: Avatar image normalization

pub mod auth;
pub mod avatar;
pub mod db;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;

/// Current version of the TaskNest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
