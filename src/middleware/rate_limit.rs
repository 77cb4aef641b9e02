use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Caps how many analyses run at once. Excess requests are rejected, not
/// queued, since each one pins a blocking inference thread.
#[derive(Debug)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    max_permits: usize,
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitMetrics {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
    pub max_permits: usize,
}

impl RateLimitMetrics {
    pub fn rejection_rate(&self) -> f64 {
        if self.total_requests > 0 {
            self.rejected_requests as f64 / self.total_requests as f64
        } else {
            0.0
        }
    }
}

impl RateLimiter {
    pub fn new(max_permits: usize) -> Self {
        info!(max_concurrent_requests = max_permits, "Initializing request semaphore");
        Self {
            semaphore: Arc::new(Semaphore::new(max_permits)),
            max_permits,
            total_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit, AppError> {
        let total = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

        self.semaphore.clone().try_acquire_owned().map_err(|_| {
            let rejected = self.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                total_requests = total,
                rejected_requests = rejected,
                "Rate limit exceeded - too many concurrent analyses"
            );
            AppError::RateLimitExceeded
        })
    }

    pub fn metrics(&self) -> RateLimitMetrics {
        RateLimitMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            available_permits: self.semaphore.available_permits(),
            max_permits: self.max_permits,
        }
    }
}

/// A held analysis permit. The middleware puts one into the request
/// extensions; the handler moves a clone into the blocking task so the slot
/// stays taken until inference actually returns, even after a timeout.
#[derive(Debug, Clone)]
pub struct AnalysisSlot(Arc<OwnedSemaphorePermit>);

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let permit = state.limiter.try_acquire()?;
    debug!(
        path = path,
        available_permits = state.limiter.metrics().available_permits,
        "Request permit acquired"
    );
    request.extensions_mut().insert(AnalysisSlot(Arc::new(permit)));

    let response = next.run(request).await;

    debug!(path = path, "Response sent");
    Ok(response)
}
