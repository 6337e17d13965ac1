//! # orgauth shared library
//!
//! Types and logic shared by the orgauth API server: credentials, tokens,
//! the authorization guard, persistence and the store contract.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, token issuance/verification, request guard
//! - `models`: database rows and their SQL
//! - `store`: the `CredentialStore` trait with PostgreSQL and in-memory backends
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
