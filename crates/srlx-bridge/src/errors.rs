use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading pipeline archives into an isolation scope
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Archive location list is empty")]
    EmptyArchiveList,

    #[error("Pipeline archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    #[error("Failed to load pipeline archive {0}: {1}")]
    LoadFailed(PathBuf, String),

    #[error("Symbol '{symbol}' not found in any of: {archives}")]
    SymbolNotFound { symbol: String, archives: String },
}

/// Errors that can occur during bridge operations
///
/// Nothing from the loaded pipeline library crosses the bridge boundary as a
/// foreign error or a panic; every failure mode is converted into one of
/// these values.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{0}")]
    Loader(#[from] LoaderError),

    #[error("Pipeline library rejected the ABI (expected version {expected}, got {actual})")]
    AbiMismatch { expected: u32, actual: u32 },

    #[error("Pipeline library rejected the argument vector: {0}")]
    InvalidOptions(String),

    #[error("{0}")]
    MissingModels(String),

    #[error("Pipeline construction failed: {0}")]
    Construction(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Bridge is not initialized (init failed or was never called)")]
    NotInitialized,

    #[error("Bridge is already initialized; create a new instance to re-initialize")]
    AlreadyInitialized,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_error_display() {
        let err = LoaderError::ArchiveNotFound(PathBuf::from("/lib/pipeline.so"));
        assert_eq!(err.to_string(), "Pipeline archive not found: /lib/pipeline.so");
    }

    #[test]
    fn test_missing_models_message_is_verbatim() {
        // The precondition diagnostic carries the library's own message,
        // trailing newline included.
        let err = BridgeError::MissingModels("missing /models/tagger.model\n".to_string());
        assert_eq!(err.to_string(), "missing /models/tagger.model\n");
    }

    #[test]
    fn test_loader_error_converts_to_bridge_error() {
        let err: BridgeError = LoaderError::EmptyArchiveList.into();
        assert!(matches!(err, BridgeError::Loader(_)));
    }
}
