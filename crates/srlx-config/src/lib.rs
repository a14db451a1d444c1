//! Pipeline configuration for the srlx bridge
//!
//! A [`PipelineConfig`] describes one initialization request for an external
//! SRL pipeline: where the pipeline's shared libraries live, which language
//! model set to use, and optional per-stage model overrides. The value is
//! immutable once built; the bridge derives its argument vector from it.
//!
//! Two on-disk formats are supported:
//! - TOML (the primary format, [`PipelineConfig::load`])
//! - the legacy `key=value` config files used by earlier deployments
//!   ([`PipelineConfig::from_legacy_cfg`])

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors from loading or validating a pipeline configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file
    Io(io::Error),
    /// The file is not valid TOML
    Parse(String),
    /// The archive location list is empty
    NoArchives,
    /// A required field is missing or empty
    MissingField(&'static str),
    /// A field holds a value that cannot be used
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config file: {}", msg),
            ConfigError::NoArchives => {
                write!(f, "Config must list at least one pipeline archive")
            }
            ConfigError::MissingField(field) => {
                write!(f, "Config field '{}' is missing or empty", field)
            }
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Configuration for one pipeline initialization
///
/// Optional stage overrides are either absent or a non-empty model path;
/// absence means "use the pipeline library's default for that stage".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Shared-library archives the pipeline is loaded from, in search order
    pub archives: Vec<PathBuf>,

    /// Language identifier handed to the pipeline (e.g. "eng")
    pub lang: String,

    /// Use the reranking parser model
    #[serde(default)]
    pub rerank: bool,

    /// Use the hybrid reranker
    #[serde(default)]
    pub hybrid: bool,

    /// Tokenizer model override
    #[serde(default)]
    pub token: Option<String>,

    /// Morphological tagger model override
    #[serde(default)]
    pub morph: Option<String>,

    /// Lemmatizer model override
    #[serde(default)]
    pub lemma: Option<String>,

    /// Part-of-speech tagger model override
    #[serde(default)]
    pub tagger: Option<String>,

    /// Dependency parser model override
    #[serde(default)]
    pub parser: Option<String>,

    /// Semantic-role-labeler model override
    #[serde(default)]
    pub srl: Option<String>,
}

impl PipelineConfig {
    /// Create a config with only the required fields set
    pub fn new(archives: Vec<PathBuf>, lang: impl Into<String>) -> Self {
        PipelineConfig {
            archives,
            lang: lang.into(),
            rerank: false,
            hybrid: false,
            token: None,
            morph: None,
            lemma: None,
            tagger: None,
            parser: None,
            srl: None,
        }
    }

    /// Load a pipeline configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a pipeline configuration from a legacy `key=value` file
    ///
    /// The legacy format is one `name=value` pair per line with the archive
    /// list under `mate_jars` as a colon-separated path list. Unknown keys
    /// (such as `yisi_home`) are ignored for compatibility.
    pub fn from_legacy_cfg<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::parse_legacy(&content);
        config.validate()?;
        Ok(config)
    }

    /// Parse the legacy `key=value` format from a string
    pub fn parse_legacy(content: &str) -> Self {
        let mut config = PipelineConfig::new(Vec::new(), "");
        for line in content.lines() {
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            match name {
                "mate_jars" | "archives" => {
                    config.archives = value
                        .split(':')
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect();
                }
                "lang" => config.lang = value.to_string(),
                "rerank" => config.rerank = parse_legacy_bool(value),
                "hybrid" => config.hybrid = parse_legacy_bool(value),
                "token" => config.token = non_empty(value),
                "morph" => config.morph = non_empty(value),
                "lemma" => config.lemma = non_empty(value),
                "tagger" => config.tagger = non_empty(value),
                "parser" => config.parser = non_empty(value),
                "srl" => config.srl = non_empty(value),
                _ => {}
            }
        }
        config
    }

    /// Validate field-level invariants
    ///
    /// The archive list must be non-empty, the language identifier must be
    /// set, and every stage override that is present must be non-empty (use
    /// `None` for "library default", never an empty string).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archives.is_empty() {
            return Err(ConfigError::NoArchives);
        }
        if self.lang.is_empty() {
            return Err(ConfigError::MissingField("lang"));
        }
        for (stage, value) in self.stage_overrides() {
            if let Some(v) = value {
                if v.is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "stage override '{}' is an empty string",
                        stage
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stage overrides in the pipeline's fixed stage order
    pub fn stage_overrides(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("token", self.token.as_deref()),
            ("morph", self.morph.as_deref()),
            ("lemma", self.lemma.as_deref()),
            ("tagger", self.tagger.as_deref()),
            ("parser", self.parser.as_deref()),
            ("srl", self.srl.as_deref()),
        ]
    }

    /// Default location of the pipeline config file
    pub fn default_path() -> Option<PathBuf> {
        #[cfg(not(target_os = "windows"))]
        let config_dir = dirs::home_dir()?.join(".config").join("srlx");

        #[cfg(target_os = "windows")]
        let config_dir = dirs::config_dir()?.join("srlx");

        Some(config_dir.join("pipeline.toml"))
    }
}

/// Legacy boolean convention: `0` and `false` are false, anything else true
fn parse_legacy_bool(value: &str) -> bool {
    value != "0" && value != "false"
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("pipeline.toml");
        if fs::write(
            &path,
            r#"
archives = ["/opt/srl/libpipeline.so"]
lang = "eng"
rerank = true
tagger = "/models/eng/tagger.model"
"#,
        )
        .is_err()
        {
            return;
        }

        let config = PipelineConfig::load(&path);
        assert!(config.is_ok_and(|c| {
            c.lang == "eng"
                && c.rerank
                && !c.hybrid
                && c.tagger.as_deref() == Some("/models/eng/tagger.model")
                && c.token.is_none()
        }));
    }

    #[test]
    fn test_parse_legacy_full() {
        let content = "yisi_home=/opt/yisi\n\
                       mate_jars=/lib/a.so:/lib/b.so\n\
                       lang=eng\n\
                       rerank=0\n\
                       hybrid=1\n\
                       token=\n\
                       tagger=/models/tagger.model\n";
        let config = PipelineConfig::parse_legacy(content);
        assert_eq!(
            config.archives,
            vec![PathBuf::from("/lib/a.so"), PathBuf::from("/lib/b.so")]
        );
        assert_eq!(config.lang, "eng");
        assert!(!config.rerank);
        assert!(config.hybrid);
        // empty legacy value means "library default"
        assert!(config.token.is_none());
        assert_eq!(config.tagger.as_deref(), Some("/models/tagger.model"));
    }

    #[test]
    fn test_legacy_bool_convention() {
        assert!(!parse_legacy_bool("0"));
        assert!(!parse_legacy_bool("false"));
        assert!(parse_legacy_bool("1"));
        assert!(parse_legacy_bool("true"));
        assert!(parse_legacy_bool("yes"));
    }

    #[test]
    fn test_validate_rejects_empty_archives() {
        let config = PipelineConfig::new(Vec::new(), "eng");
        assert!(matches!(config.validate(), Err(ConfigError::NoArchives)));
    }

    #[test]
    fn test_validate_rejects_missing_lang() {
        let config = PipelineConfig::new(vec![PathBuf::from("/lib/a.so")], "");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("lang"))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_override() {
        let mut config = PipelineConfig::new(vec![PathBuf::from("/lib/a.so")], "eng");
        config.parser = Some(String::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_stage_override_order_is_fixed() {
        let config = PipelineConfig::new(vec![PathBuf::from("/lib/a.so")], "eng");
        let names: Vec<&str> = config.stage_overrides().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["token", "morph", "lemma", "tagger", "parser", "srl"]
        );
    }
}
