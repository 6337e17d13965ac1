//! # orgauth API Server Library
//!
//! HTTP surface of the orgauth identity and organisation service.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and the bearer-token guard
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated JSON body extractor
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
