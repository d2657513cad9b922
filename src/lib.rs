//! Lending Ledger
//!
//! The consistency core of a library catalog: book stock, the borrow/return
//! lifecycle of checkouts and incremental rating aggregates, served as a REST
//! JSON API. Every stock or rating mutation is a single conditional update
//! against the store, so concurrent requests can never drive a counter out of
//! its bounds.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository, config.lending.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
