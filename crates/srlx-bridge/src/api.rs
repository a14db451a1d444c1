//! Capability interface implemented by pipeline backends
//!
//! The bridge never talks to a loaded library through raw symbols directly;
//! it programs against these three traits. The production implementation
//! ([`crate::abi::RawApi`]) binds them to the C ABI exported by a pipeline
//! shared library; tests (or hosts that link a pipeline statically) can
//! provide their own implementation and feed it to
//! [`crate::SrlBridge::init_with_api`].

use crate::errors::BridgeError;

/// Entry capability of a pipeline backend: turn an argument vector into a
/// validated option set
pub trait PipelineApi: Send {
    /// Parse a command-line-style argument vector into pipeline options
    ///
    /// Fails if the vector violates the library's option grammar (unknown
    /// flag, malformed value).
    fn parse_options(&self, args: &[String]) -> Result<Box<dyn PipelineOptions>, BridgeError>;
}

/// A parsed option set, ready for precondition checks and pipeline
/// construction
pub trait PipelineOptions: Send {
    /// Check that every model file the options reference exists
    ///
    /// Returns `Some(message)` naming the missing files, `None` when all
    /// preconditions hold. Must be cheap relative to pipeline construction;
    /// the bridge calls it first so a broken configuration never pays the
    /// model-loading cost.
    fn verify_files(&self) -> Option<String>;

    /// Materialize the pipeline (loads models; expensive)
    fn build_pipeline(self: Box<Self>) -> Result<Box<dyn Pipeline>, BridgeError>;
}

/// A ready pipeline: one sentence in, one formatted parse out
///
/// The bridge treats the output as an opaque formatted string; its structure
/// belongs to the pipeline library. Implementations are not required to be
/// re-entrant: the bridge serializes `analyze` calls per instance.
pub trait Pipeline: Send {
    fn analyze(&mut self, sentence: &str) -> Result<String, BridgeError>;
}
