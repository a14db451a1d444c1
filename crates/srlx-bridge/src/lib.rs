//! Isolated dynamic-loading bridge to an external SRL pipeline
//!
//! This crate lets a host initialize and repeatedly invoke an external,
//! independently-versioned semantic-role-labeling pipeline without linking
//! against it:
//! 1. Each [`SrlBridge`] loads the pipeline's shared libraries into a private
//!    [`IsolationLoader`] scope, so two instances in the same process can run
//!    two different pipeline versions side by side.
//! 2. The loaded library is driven through the narrow capability traits in
//!    [`api`], bound over a small C ABI ([`abi`]).
//!
//! The host-facing contract is two calls: [`SrlBridge::init`] once per
//! instance, then [`SrlBridge::parse`] per sentence. Every failure mode is a
//! value ([`BridgeError`] or an absent parse), never a foreign panic.

pub mod abi;
pub mod api;
pub mod args;
mod bridge;
pub mod errors;
pub mod fallback;
pub mod loader;
pub mod sink;

pub use api::{Pipeline, PipelineApi, PipelineOptions};
pub use args::build_argument_vector;
pub use bridge::{BridgeStatus, SrlBridge};
pub use errors::{BridgeError, LoaderError};
pub use loader::IsolationLoader;
pub use sink::{LogSink, LoggerSink, NullSink};
