//! HTTP surface of the trigger service
//!
//! A single endpoint, `POST /api/reload`, authenticated with a static bearer
//! token. Everything else gets the router's default 404.

pub mod auth;
pub mod handlers;
pub mod responses;
pub mod server;

pub use server::{create_router, serve, RELOAD_PATH};
