//! Middleware modules for the API server
//!
//! - `security`: security response headers
//!
//! The bearer-token guard lives in `app::require_auth`.

pub mod security;
