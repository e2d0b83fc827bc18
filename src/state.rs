use std::sync::Arc;

use crate::config::AppConfig;
use crate::repositories::Repositories;
use crate::services::booking::{BookingPolicy, BookingService};
use crate::store::RecordStore;

pub struct AppState {
    pub config: AppConfig,
    pub repos: Arc<Repositories>,
    pub bookings: BookingService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let repos = Arc::new(Repositories::new(store, config.store_timeout()));
        let bookings = BookingService::new(repos.clone(), BookingPolicy::from(&config));
        Self {
            config,
            repos,
            bookings,
        }
    }
}
