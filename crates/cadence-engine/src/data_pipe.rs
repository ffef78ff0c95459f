//! The engine facade: owns the handler list and the scheduler loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cadence_config as config;
use cadence_types::{Context, PipeError, Result};

use crate::handler::{build_handler, DynHandler};
use crate::pipeline::run_handler_pipe;
use crate::schedule::Schedule;

#[derive(Debug)]
pub struct DataPipe {
    engine: config::Engine,
    handlers: Arc<[DynHandler]>,
}

impl DataPipe {
    /// Instantiate every configured handler, in declaration order. Handler
    /// instances are created once and live for the process.
    pub fn new(cfg: &config::Config) -> Result<Self> {
        if cfg.handlers.is_empty() {
            return Err(PipeError::Config("no handlers defined".into()));
        }

        let mut handlers = Vec::with_capacity(cfg.handlers.len());
        for entry in &cfg.handlers {
            let handler = build_handler(&entry.name, &entry.handler).map_err(|e| {
                PipeError::Construction {
                    name: entry.name.clone(),
                    message: bare(e),
                }
            })?;
            handlers.push(handler);
        }

        Ok(Self {
            engine: cfg.engine.clone(),
            handlers: Arc::from(handlers),
        })
    }

    /// Build a data pipe around pre-constructed handlers. Used by tests and
    /// embedders that supply their own handler implementations.
    pub fn with_handlers(engine: config::Engine, handlers: Vec<DynHandler>) -> Result<Self> {
        if handlers.is_empty() {
            return Err(PipeError::Config("no handlers defined".into()));
        }
        Ok(Self {
            engine,
            handlers: Arc::from(handlers),
        })
    }

    /// Drive periodic jobs until `cancel` fires.
    ///
    /// One job at a time: the timer is re-armed only after the current job
    /// completes, so missed ticks are not queued. A failed job is logged and
    /// never stops the loop.
    pub async fn run(&self, cancel: CancellationToken) {
        if !self.engine.disable_run_on_start {
            match self.run_job(&cancel).await {
                Ok(()) => tracing::info!("job completed successfully"),
                Err(e) => tracing::error!(error = %e, "failed to run job"),
            }
        }

        let schedule = match Schedule::new(self.engine.interval, self.engine.run_at.as_deref()) {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::error!(error = %e, "failed to create timer");
                return;
            }
        };

        let mut next = tokio::time::Instant::now() + schedule.first_delay;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("data pipe stopped");
                    return;
                }
                _ = tokio::time::sleep_until(next) => {
                    match self.run_job(&cancel).await {
                        Ok(()) => tracing::info!("job completed successfully"),
                        Err(e) => tracing::error!(error = %e, "failed to run job"),
                    }
                    next = tokio::time::Instant::now() + schedule.repeat;
                }
            }
        }
    }

    /// One complete traversal of the handler list from an empty context.
    async fn run_job(&self, cancel: &CancellationToken) -> Result<()> {
        run_handler_pipe(
            cancel.clone(),
            Context::new(),
            Arc::clone(&self.handlers),
            0,
        )
        .await
        .map_err(|e| PipeError::Pipeline(e.to_string()))
    }
}

fn bare(err: PipeError) -> String {
    match err {
        PipeError::Config(msg) => msg,
        other => other.to_string(),
    }
}
