//! Request timestamp.

use std::sync::Arc;

use async_trait::async_trait;

use super::pipeline::{Exchange, Guard};
use crate::error::AppError;
use crate::utils::clock::Clock;

/// Stamps `requested_at` on the request context. Last guard in the chain.
pub struct RequestTimeGuard {
    clock: Arc<dyn Clock>,
}

impl RequestTimeGuard {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Guard for RequestTimeGuard {
    fn name(&self) -> &'static str {
        "request_time"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        exchange.context.requested_at = Some(self.clock.now());
        Ok(())
    }
}
