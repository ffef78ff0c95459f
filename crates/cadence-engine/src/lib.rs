//! The Cadence pipeline execution engine.
//!
//! This crate implements the core runner: the handler contract and its two
//! built-in kinds (HTTP invoker and boolean filter), the recursive fan-out
//! evaluator, the periodic scheduler, and the `DataPipe` facade that ties
//! them to a validated configuration.

pub mod data_pipe;
pub mod filter;
pub mod handler;
pub mod http;
pub mod pipeline;
pub mod schedule;

pub use data_pipe::DataPipe;
pub use filter::FilterHandler;
pub use handler::{build_handler, DynHandler, Handler};
pub use http::HttpHandler;
pub use pipeline::run_handler_pipe;
pub use schedule::Schedule;
