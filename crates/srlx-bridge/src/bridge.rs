//! Bridge lifecycle: one isolated pipeline per instance
//!
//! An [`SrlBridge`] owns at most one external pipeline. It starts
//! uninitialized, transitions exactly once through [`SrlBridge::init`] to
//! ready or failed, and stays there: re-initialization is a typed error, not
//! a silent handle swap, so a successfully built pipeline can never be leaked
//! by a second `init` call. Hosts that want a fresh attempt create a fresh
//! instance.

use crate::abi::RawApi;
use crate::api::{Pipeline, PipelineApi};
use crate::args::build_argument_vector;
use crate::errors::BridgeError;
use crate::fallback;
use crate::loader::IsolationLoader;
use crate::sink::{LogSink, LoggerSink};
use srlx_config::PipelineConfig;
use srlx_logger as logger;
use std::sync::Mutex;

/// Lifecycle state of a bridge instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    /// `init` has not been called
    Uninitialized,
    /// `init` succeeded; the instance holds a pipeline
    Ready,
    /// `init` failed; the instance holds a diagnostic and stays unusable
    Failed,
}

enum PipelineState {
    Uninitialized,
    // The mutex is the per-instance concurrency policy: the loaded pipeline
    // is not assumed re-entrant, so parse calls on one instance serialize.
    Ready(Mutex<Box<dyn Pipeline>>),
    Failed(String),
}

/// A host-facing bridge to one isolated external pipeline
pub struct SrlBridge {
    state: PipelineState,
    sink: Option<Box<dyn LogSink>>,
}

impl SrlBridge {
    /// Create an uninitialized bridge with the default log sink
    pub fn new() -> Self {
        SrlBridge {
            state: PipelineState::Uninitialized,
            sink: None,
        }
    }

    /// Create an uninitialized bridge with a custom sink for plugin chatter
    pub fn with_log_sink(sink: Box<dyn LogSink>) -> Self {
        SrlBridge {
            state: PipelineState::Uninitialized,
            sink: Some(sink),
        }
    }

    /// Initialize the pipeline from a configuration
    ///
    /// Loads the configured archives into a fresh isolation scope, binds the
    /// pipeline ABI, parses the derived argument vector, verifies that every
    /// referenced model file exists and only then pays for pipeline
    /// construction. On failure the instance transitions to failed and the
    /// diagnostic is kept (see [`SrlBridge::diagnostic`]).
    ///
    /// Calling `init` on an already-initialized instance (ready or failed)
    /// returns [`BridgeError::AlreadyInitialized`] and leaves the instance
    /// untouched.
    pub fn init(&mut self, config: &PipelineConfig) -> Result<(), BridgeError> {
        self.guard_uninitialized()?;
        let outcome = self.bind_api(config).and_then(|api| Self::build(&*api, config));
        self.store(outcome)
    }

    /// Initialize with a caller-supplied backend instead of loading archives
    ///
    /// This is the seam for hosts that link a pipeline statically and for
    /// tests; everything after archive loading (argument marshalling, file
    /// verification, construction, state transitions) behaves exactly as in
    /// [`SrlBridge::init`].
    pub fn init_with_api(
        &mut self,
        api: Box<dyn PipelineApi>,
        config: &PipelineConfig,
    ) -> Result<(), BridgeError> {
        self.guard_uninitialized()?;
        let outcome = Self::build(&*api, config);
        self.store(outcome)
    }

    fn guard_uninitialized(&self) -> Result<(), BridgeError> {
        match self.state {
            PipelineState::Uninitialized => Ok(()),
            _ => Err(BridgeError::AlreadyInitialized),
        }
    }

    fn bind_api(&mut self, config: &PipelineConfig) -> Result<Box<dyn PipelineApi>, BridgeError> {
        config
            .validate()
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        let loader = IsolationLoader::open(&config.archives)?;
        let sink = self.sink.take().unwrap_or_else(|| Box::new(LoggerSink));
        RawApi::bind(loader, sink)
    }

    fn build(
        api: &dyn PipelineApi,
        config: &PipelineConfig,
    ) -> Result<Box<dyn Pipeline>, BridgeError> {
        let args = build_argument_vector(config);
        logger::debug(&format!("Pipeline arguments: {:?}", args));

        let options = api.parse_options(&args)?;

        // Precondition check before the expensive part: a configuration with
        // missing model files must never reach the pipeline factory. The
        // library's message is kept verbatim, with a trailing line break.
        if let Some(message) = options.verify_files() {
            return Err(BridgeError::MissingModels(format!("{}\n", message)));
        }

        logger::spinner_start("Loading pipeline models");
        let pipeline = options.build_pipeline();
        logger::spinner_finish();

        if pipeline.is_ok() {
            logger::success("Pipeline initialized");
        }
        pipeline
    }

    fn store(&mut self, outcome: Result<Box<dyn Pipeline>, BridgeError>) -> Result<(), BridgeError> {
        match outcome {
            Ok(pipeline) => {
                self.state = PipelineState::Ready(Mutex::new(pipeline));
                Ok(())
            }
            Err(e) => {
                let diagnostic = e.to_string();
                logger::error(&format!("Pipeline initialization failed: {}", diagnostic.trim_end()));
                self.state = PipelineState::Failed(diagnostic);
                Err(e)
            }
        }
    }

    /// Parse one sentence through the pipeline
    ///
    /// Returns `Ok(Some(text))` with the pipeline's formatted parse,
    /// `Ok(None)` when the pipeline failed on this sentence (the failure is
    /// logged with the offending input and the instance stays usable), or
    /// `Err(BridgeError::NotInitialized)` if `init` has not succeeded.
    pub fn parse(&self, sentence: &str) -> Result<Option<String>, BridgeError> {
        let PipelineState::Ready(pipeline) = &self.state else {
            return Err(BridgeError::NotInitialized);
        };

        let mut guard = pipeline
            .lock()
            .map_err(|_| BridgeError::Pipeline("pipeline lock poisoned".to_string()))?;

        match guard.analyze(sentence) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                logger::error(&format!("Parse failed: {} (sentence: {:?})", e, sentence));
                Ok(None)
            }
        }
    }

    /// Parse one sentence, falling back to placeholder CoNLL-09 rows
    ///
    /// Empty sentences and sentences over [`fallback::MAX_PARSE_TOKENS`]
    /// tokens never reach the pipeline; a sentence the pipeline fails on
    /// degrades to the same placeholder rows instead of being dropped.
    pub fn parse_or_fallback(&self, sentence: &str) -> Result<String, BridgeError> {
        let tokens = fallback::tokenize(sentence);
        if fallback::exceeds_parse_limit(sentence) {
            return Ok(fallback::noparse(&tokens));
        }
        match self.parse(sentence)? {
            Some(text) => Ok(text),
            None => Ok(fallback::noparse(&tokens)),
        }
    }

    /// Parse a batch of sentences sequentially with fallback
    pub fn parse_batch(&self, sentences: &[String]) -> Result<Vec<String>, BridgeError> {
        sentences.iter().map(|s| self.parse_or_fallback(s)).collect()
    }

    /// Current lifecycle state
    pub fn status(&self) -> BridgeStatus {
        match self.state {
            PipelineState::Uninitialized => BridgeStatus::Uninitialized,
            PipelineState::Ready(_) => BridgeStatus::Ready,
            PipelineState::Failed(_) => BridgeStatus::Failed,
        }
    }

    /// Whether the instance holds a ready pipeline
    pub fn is_ready(&self) -> bool {
        self.status() == BridgeStatus::Ready
    }

    /// The stored initialization diagnostic; empty means success (or that
    /// `init` has not run yet)
    pub fn diagnostic(&self) -> &str {
        match &self.state {
            PipelineState::Failed(diagnostic) => diagnostic,
            _ => "",
        }
    }
}

impl Default for SrlBridge {
    fn default() -> Self {
        Self::new()
    }
}
