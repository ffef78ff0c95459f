//! Filter handler: evaluates a boolean expression against the context and
//! either lets the branch continue once or drops it silently.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cadence_config as config;
use cadence_expr::{substitute, Value};
use cadence_types::{Context, HandlerResult, PipeError, Result};

use crate::handler::Handler;

pub struct FilterHandler {
    name: String,
    cfg: config::FilterHandler,
}

impl FilterHandler {
    pub fn new(name: &str, cfg: &config::FilterHandler) -> Self {
        Self {
            name: name.to_string(),
            cfg: cfg.clone(),
        }
    }
}

#[async_trait]
impl Handler for FilterHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(
        &self,
        _cancel: &CancellationToken,
        data: &Context,
    ) -> Result<Vec<HandlerResult>> {
        let expression = substitute(&self.cfg.expression, data).ok_or_else(|| {
            PipeError::UnresolvedPlaceholders {
                field: "expression".into(),
            }
        })?;

        let value =
            cadence_expr::eval(&expression).map_err(|e| PipeError::Expression(e.to_string()))?;
        let result = match value {
            Value::Bool(b) => b,
            _ => return Err(PipeError::NonBooleanExpression),
        };

        // `expect_false` lets configurations express negative filters without
        // rewriting the expression.
        if result == self.cfg.expect_false {
            tracing::debug!(handler = %self.name, %expression, "filter dropped branch");
            return Ok(Vec::new());
        }

        // A single empty record: the pipeline continues exactly once with no
        // added context keys.
        Ok(vec![HandlerResult::new()])
    }
}
