use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::inference::ModelSet;
use crate::middleware::rate_limit::RateLimiter;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub models: Arc<ModelSet>,
    pub limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, models: Arc<ModelSet>) -> Self {
        let limiter = RateLimiter::new(config.max_concurrent_requests);
        Self {
            config: Arc::new(config),
            models,
            limiter: Arc::new(limiter),
            started_at: Instant::now(),
        }
    }
}
