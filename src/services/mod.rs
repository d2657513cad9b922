//! Business logic services

pub mod checkouts;
pub mod inventory;
pub mod ratings;
pub mod reports;
pub mod reviews;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub inventory: inventory::InventoryService,
    pub checkouts: checkouts::CheckoutService,
    pub ratings: ratings::RatingService,
    pub reviews: reviews::ReviewService,
    pub reports: reports::ReportService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, lending: LendingConfig) -> Self {
        Self {
            inventory: inventory::InventoryService::new(repository.clone()),
            ratings: ratings::RatingService::new(repository.clone(), lending.review_move_attempts),
            checkouts: checkouts::CheckoutService::new(repository.clone(), lending),
            reviews: reviews::ReviewService::new(repository.clone()),
            reports: reports::ReportService::new(repository),
        }
    }
}
