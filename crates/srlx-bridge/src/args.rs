//! Argument-vector marshalling for the pipeline's option parser
//!
//! The external pipeline library is driven through a command-line-style
//! argument vector. The flag order below is a compatibility contract with the
//! library's option grammar and must not be reordered: language id, the
//! tokenization flag, the reranker/hybrid switches, then one `-<stage> value`
//! pair per configured stage override in the fixed stage order.

use srlx_config::PipelineConfig;

/// Build the argument vector for a configuration
///
/// Deterministic: the same config always yields the same vector. Absent stage
/// overrides contribute nothing.
pub fn build_argument_vector(config: &PipelineConfig) -> Vec<String> {
    let mut args = Vec::new();
    args.push(config.lang.clone());
    args.push("-tokenize".to_string());
    if config.rerank {
        args.push("-reranker".to_string());
    }
    if config.hybrid {
        args.push("-hybrid".to_string());
    }
    for (stage, value) in config.stage_overrides() {
        if let Some(value) = value {
            if !value.is_empty() {
                args.push(format!("-{}", stage));
                args.push(value.to_string());
            }
        }
    }
    args
}
