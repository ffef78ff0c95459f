//! The tree-structured fan-out evaluator.
//!
//! Each invocation runs one handler, then spawns one concurrent branch per
//! result record over the remaining stages. Branches share nothing by value
//! (every child gets an independent context copy) but share the handler
//! instances, so per-handler serialization policies still apply.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cadence_types::{Context, PipeError, Result};

use crate::handler::DynHandler;

/// Run the handler chain starting at `index` against `data`.
///
/// Sibling branches run unordered and in parallel without limit; the call
/// joins every spawned branch before returning, even under cancellation, and
/// aggregates branch errors into one newline-joined failure.
pub fn run_handler_pipe(
    cancel: CancellationToken,
    data: Context,
    handlers: Arc<[DynHandler]>,
    index: usize,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
    Box::pin(async move {
        let Some(handler) = handlers.get(index) else {
            return Ok(());
        };

        let results = match handler.handle(&cancel, &data).await {
            Ok(results) => results,
            Err(e) => {
                return Err(PipeError::Handler {
                    handler: handler.name().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let mut branches = Vec::with_capacity(results.len());
        for record in &results {
            let mut child = data.clone();
            for (key, value) in record {
                child.insert(
                    format!("{}.{}", handler.name(), key),
                    value.get().to_string(),
                );
            }
            branches.push(tokio::spawn(run_handler_pipe(
                cancel.clone(),
                child,
                Arc::clone(&handlers),
                index + 1,
            )));
        }

        let mut errors = Vec::new();
        for branch in branches {
            match branch.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => errors.push(e.to_string()),
                Err(e) => errors.push(format!("pipeline branch panicked: {e}")),
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        Err(PipeError::Pipeline(errors.join("\n")))
    })
}
