//! Random number generator endpoint.

use async_trait::async_trait;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

pub const MAX_COUNT: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    #[default]
    Integer,
    Float,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RandomNumberParams {
    /// Lower bound (inclusive).
    #[serde(default = "default_min")]
    pub min: i64,

    /// Upper bound (inclusive for integers).
    #[serde(default = "default_max")]
    pub max: i64,

    /// How many numbers to draw; capped at 100.
    #[serde(default = "default_count")]
    pub count: usize,

    /// `integer` (default) or `float`.
    #[serde(default, rename = "type")]
    pub kind: NumberKind,
}

fn default_min() -> i64 {
    1
}

fn default_max() -> i64 {
    100
}

fn default_count() -> usize {
    1
}

pub struct RandomNumberTool;

fn draw(kind: NumberKind, min: i64, max: i64) -> Value {
    let mut rng = rand::thread_rng();
    match kind {
        NumberKind::Integer => json!(rng.gen_range(min..=max)),
        NumberKind::Float if min == max => json!(min as f64),
        NumberKind::Float => {
            let value = rng.gen_range(min as f64..max as f64);
            json!((value * 10_000.0).round() / 10_000.0)
        }
    }
}

#[async_trait]
impl Endpoint for RandomNumberTool {
    const CATEGORY: &'static str = "generators";
    const NAME: &'static str = "random-number";
    const DESCRIPTION: &'static str = "Draw random integers or floats from a range";
    type Params = RandomNumberParams;

    async fn execute(&self, params: RandomNumberParams) -> Result<HandlerOutcome, EndpointError> {
        if params.min > params.max {
            return Ok(Failure::invalid_input("min must not be greater than max")
                .with_detail("min", params.min)
                .with_detail("max", params.max)
                .into());
        }
        let count = params.count.clamp(1, MAX_COUNT);
        let numbers: Vec<Value> = (0..count).map(|_| draw(params.kind, params.min, params.max)).collect();

        Ok(HandlerOutcome::success(json!({
            "numbers": numbers,
            "count": count,
            "min": params.min,
            "max": params.max,
            "type": match params.kind {
                NumberKind::Integer => "integer",
                NumberKind::Float => "float",
            },
        })))
    }
}
