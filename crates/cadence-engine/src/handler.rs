//! Handler contract, dynamic dispatch wrapper, and the construction switch.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cadence_config as config;
use cadence_types::{Context, HandlerResult, Result};

use crate::filter::FilterHandler;
use crate::http::HttpHandler;

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// One pipeline stage: given the accumulated context, produce a list of
/// result records.
///
/// An empty list terminates the branch; a list of length N fans out into N
/// child invocations of the remaining stages. Handlers must abort promptly
/// when `cancel` fires.
#[async_trait]
pub trait Handler: Send + Sync {
    /// The handler's declared name; result keys are namespaced under it.
    fn name(&self) -> &str;

    async fn handle(
        &self,
        cancel: &CancellationToken,
        data: &Context,
    ) -> Result<Vec<HandlerResult>>;
}

// ---------------------------------------------------------------------------
// DynHandler — object-safe wrapper
// ---------------------------------------------------------------------------

pub struct DynHandler(Box<dyn Handler>);

impl std::fmt::Debug for DynHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DynHandler").field(&self.0.name()).finish()
    }
}

impl DynHandler {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self(Box::new(handler))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        data: &Context,
    ) -> Result<Vec<HandlerResult>> {
        self.0.handle(cancel, data).await
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build a handler instance from its configuration entry. New kinds extend
/// the tag enum and this switch.
pub fn build_handler(name: &str, cfg: &config::Handler) -> Result<DynHandler> {
    match cfg.kind {
        config::HandlerType::Http => Ok(DynHandler::new(HttpHandler::new(name, &cfg.http)?)),
        config::HandlerType::Filter => Ok(DynHandler::new(FilterHandler::new(name, &cfg.filter))),
    }
}
