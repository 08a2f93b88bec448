//! HTTP parameter pollution guard.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::pipeline::{Exchange, Guard};
use crate::domain::context::RequestBody;
use crate::error::AppError;

/// Parameters that may legitimately repeat, e.g. `?duration=5&duration=9`.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "duration",
    "ratingsAverage",
    "ratingsQuantity",
    "maxGroupSize",
    "difficulty",
    "price",
];

/// Collapses repeated parameters to their last value.
///
/// Allow-listed parameters keep every value. Dropped values are recorded per
/// parameter in `query_polluted`. Form bodies get the same treatment at their top
/// level; JSON bodies are left alone.
pub struct ParameterPollutionGuard {
    whitelist: Vec<String>,
}

impl ParameterPollutionGuard {
    pub fn new<I, S>(whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }

    fn is_whitelisted(&self, key: &str) -> bool {
        self.whitelist.iter().any(|w| w == key)
    }

    /// Collapses arrays in `params`, returning the dropped values by key.
    pub fn collapse(&self, params: &mut Map<String, Value>) -> Map<String, Value> {
        let mut polluted = Map::new();

        for (key, value) in params.iter_mut() {
            if self.is_whitelisted(key) {
                continue;
            }
            let Value::Array(items) = value else {
                continue;
            };
            let Some(last) = items.pop() else {
                continue;
            };

            polluted.insert(key.clone(), Value::Array(std::mem::take(items)));
            *value = last;
        }

        polluted
    }
}

impl Default for ParameterPollutionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_WHITELIST.iter().copied())
    }
}

#[async_trait]
impl Guard for ParameterPollutionGuard {
    fn name(&self) -> &'static str {
        "parameter_pollution"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        let context = &mut exchange.context;

        context.query_polluted = self.collapse(&mut context.query);
        if let RequestBody::Form(form) = &mut context.body {
            self.collapse(form);
        }
        Ok(())
    }
}
