//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is a plain value passed to [`crate::pipeline::Pipeline`]; nothing is read
//! from ambient global state. It can be built in code or read from a JSON file where every section
//! is optional:
//!
//! ```json
//! {
//!   "source": "movies_metadata.csv",
//!   "loader": { "delimiter": "," },
//!   "batch": { "error_limit": 10, "progress_every": 100 },
//!   "store": { "kind": "sqlite", "path": "movies.sqlite" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::error::ConfigError;
use crate::ingestion::LoaderOptions;
use crate::normalize::NormalizerConfig;
use crate::store::StoreConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path of the tabular source file.
    pub source: PathBuf,
    pub loader: LoaderOptions,
    pub normalizer: NormalizerConfig,
    pub batch: BatchOptions,
    pub store: StoreConfig,
}

impl PipelineConfig {
    /// Default configuration for `source`.
    pub fn for_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject settings no run can succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.as_os_str().is_empty() {
            return Err(invalid("source path is empty"));
        }
        if self.loader.delimiter_byte().is_none() {
            return Err(invalid(format!(
                "loader.delimiter {:?} must be a single ASCII character",
                self.loader.delimiter
            )));
        }
        if self.batch.progress_every == 0 {
            return Err(invalid("batch.progress_every must be > 0"));
        }
        if self.batch.key_prefix.is_empty() {
            return Err(invalid("batch.key_prefix must not be empty"));
        }
        if self.batch.id_field.is_empty() {
            return Err(invalid("batch.id_field must not be empty"));
        }
        if let Some(conc) = &self.batch.concurrency {
            if conc.max_in_flight == 0 {
                return Err(invalid("batch.concurrency.max_in_flight must be > 0"));
            }
            if conc.num_threads == Some(0) {
                return Err(invalid("batch.concurrency.num_threads must be > 0 when set"));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::PipelineConfig;
    use crate::batch::ConcurrencyOptions;
    use crate::error::ConfigError;
    use crate::store::StoreConfig;

    #[test]
    fn minimal_json_uses_defaults() {
        let cfg = PipelineConfig::from_json_str(r#"{"source": "movies_metadata.csv"}"#).unwrap();
        assert_eq!(cfg.source, PathBuf::from("movies_metadata.csv"));
        assert_eq!(cfg.batch.error_limit, 10);
        assert_eq!(cfg.batch.key_prefix, "movie_");
        assert_eq!(cfg.store, StoreConfig::Memory);
        assert_eq!(cfg.normalizer.boolean_fields, vec!["adult", "video"]);
        cfg.validate().unwrap();
    }

    #[test]
    fn nested_sections_override_defaults() {
        let cfg = PipelineConfig::from_json_str(
            r#"{
                "source": "m.csv",
                "batch": {"error_limit": 3, "concurrency": {"num_threads": 2, "max_in_flight": 4}},
                "store": {"kind": "sqlite", "path": "out.sqlite"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.batch.error_limit, 3);
        assert_eq!(cfg.batch.progress_every, 100);
        assert_eq!(
            cfg.batch.concurrency,
            Some(ConcurrencyOptions {
                num_threads: Some(2),
                max_in_flight: 4
            })
        );
        assert_eq!(
            cfg.store,
            StoreConfig::Sqlite {
                path: PathBuf::from("out.sqlite")
            }
        );
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        assert!(matches!(
            PipelineConfig::default().validate(),
            Err(ConfigError::Invalid { .. })
        ));

        let mut cfg = PipelineConfig::for_source("m.csv");
        cfg.batch.progress_every = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::for_source("m.csv");
        cfg.batch.concurrency = Some(ConcurrencyOptions {
            num_threads: Some(2),
            max_in_flight: 0,
        });
        assert!(cfg.validate().unwrap_err().to_string().contains("max_in_flight"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PipelineConfig::from_json_str("{source: 1}"),
            Err(ConfigError::Parse(_))
        ));
    }
}
