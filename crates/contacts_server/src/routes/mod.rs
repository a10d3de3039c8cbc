//! HTTP surface: JSON API, HTML pages, static assets and the health probe.

pub mod contacts;
pub mod pages;

pub const HEALTH_BODY: &str = "OK";

/// Liveness probe; does not touch the store.
pub async fn health_handler() -> &'static str {
    HEALTH_BODY
}
