//! Integration tests for the srlx bridge
//!
//! These drive the public API end to end with an in-process mock backend,
//! covering the full configure -> init -> parse flow a host goes through.

use srlx_bridge::{
    build_argument_vector, BridgeError, BridgeStatus, Pipeline, PipelineApi, PipelineOptions,
    SrlBridge,
};
use srlx_config::PipelineConfig;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Minimal well-behaved backend with a per-instance version label, so tests
/// can observe that each bridge talks to its own backend only.
struct VersionedApi {
    version: &'static str,
    seen_args: Arc<Mutex<Vec<Vec<String>>>>,
}

struct VersionedOptions {
    version: &'static str,
}

struct VersionedPipeline {
    version: &'static str,
}

impl PipelineApi for VersionedApi {
    fn parse_options(&self, args: &[String]) -> Result<Box<dyn PipelineOptions>, BridgeError> {
        if let Ok(mut seen) = self.seen_args.lock() {
            seen.push(args.to_vec());
        }
        Ok(Box::new(VersionedOptions {
            version: self.version,
        }))
    }
}

impl PipelineOptions for VersionedOptions {
    fn verify_files(&self) -> Option<String> {
        None
    }

    fn build_pipeline(self: Box<Self>) -> Result<Box<dyn Pipeline>, BridgeError> {
        Ok(Box::new(VersionedPipeline {
            version: self.version,
        }))
    }
}

impl Pipeline for VersionedPipeline {
    fn analyze(&mut self, sentence: &str) -> Result<String, BridgeError> {
        Ok(format!("{}:{}", self.version, sentence))
    }
}

fn eng_config() -> PipelineConfig {
    PipelineConfig::new(vec![PathBuf::from("/lib/mate.jar")], "eng")
}

#[test]
fn end_to_end_scenario() {
    // PipelineConfig with no overrides derives exactly ["eng", "-tokenize"].
    let config = eng_config();
    assert_eq!(build_argument_vector(&config), vec!["eng", "-tokenize"]);

    let seen_args = Arc::new(Mutex::new(Vec::new()));
    let api = VersionedApi {
        version: "v1",
        seen_args: Arc::clone(&seen_args),
    };

    let mut bridge = SrlBridge::new();
    assert!(bridge.init_with_api(Box::new(api), &config).is_ok());
    assert_eq!(bridge.diagnostic(), "");
    assert_eq!(bridge.status(), BridgeStatus::Ready);

    // A valid sentence yields a non-empty textual parse.
    let parsed = bridge.parse("The cat sleeps.");
    assert!(parsed.is_ok_and(|p| p.is_some_and(|text| !text.is_empty())));

    // An empty sentence never becomes an unhandled failure.
    let empty = bridge.parse_or_fallback("");
    assert!(empty.is_ok());

    // The backend saw the derived argument vector, once.
    let seen = seen_args.lock().ok();
    assert!(seen.is_some_and(|s| s.as_slice() == [vec!["eng".to_string(), "-tokenize".to_string()]]));
}

#[test]
fn two_instances_stay_isolated() {
    // Two bridges over "the same" pipeline at different versions: parses from
    // one must never observe the other's backend.
    let mut old = SrlBridge::new();
    let mut new = SrlBridge::new();
    let shared_old = Arc::new(Mutex::new(Vec::new()));
    let shared_new = Arc::new(Mutex::new(Vec::new()));

    let init_old = old.init_with_api(
        Box::new(VersionedApi {
            version: "mate-3.3",
            seen_args: Arc::clone(&shared_old),
        }),
        &eng_config(),
    );
    let init_new = new.init_with_api(
        Box::new(VersionedApi {
            version: "mate-4.0",
            seen_args: Arc::clone(&shared_new),
        }),
        &eng_config(),
    );
    assert!(init_old.is_ok());
    assert!(init_new.is_ok());

    let from_old = old.parse("sentence");
    let from_new = new.parse("sentence");
    assert!(from_old.is_ok_and(|p| p.as_deref() == Some("mate-3.3:sentence")));
    assert!(from_new.is_ok_and(|p| p.as_deref() == Some("mate-4.0:sentence")));
}

#[test]
fn legacy_config_drives_the_same_argument_vector() {
    let legacy = "mate_jars=/lib/mate.jar\n\
                  lang=eng\n\
                  rerank=1\n\
                  tagger=/models/eng/tagger.model\n";
    let config = PipelineConfig::parse_legacy(legacy);
    assert_eq!(
        build_argument_vector(&config),
        vec![
            "eng",
            "-tokenize",
            "-reranker",
            "-tagger",
            "/models/eng/tagger.model",
        ]
    );
}

#[test]
fn failed_archive_loading_leaves_a_diagnostic_not_a_panic() {
    let mut bridge = SrlBridge::new();
    let config = PipelineConfig::new(vec![PathBuf::from("/definitely/not/there.so")], "eng");

    let result = bridge.init(&config);
    assert!(matches!(result, Err(BridgeError::Loader(_))));
    assert_eq!(bridge.status(), BridgeStatus::Failed);
    assert!(!bridge.diagnostic().is_empty());

    // The instance stays unusable but well-behaved.
    assert!(matches!(
        bridge.parse("anything"),
        Err(BridgeError::NotInitialized)
    ));
}
