//! TOML configuration.
//!
//! Every key is optional; anything left out keeps its default.
//!
//! ```toml
//! [extractor]
//! max_input_len = 10000
//! external_timeout_secs = 20
//! simulated_latency_ms = 2000
//! heuristic_fallback = false
//!
//! [csv]
//! max_rows = 1000
//! max_bytes = 5242880
//! max_field_len = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "csv")]
use crate::csv::{CsvConfig, CsvImporter};
use crate::extract::{Extractor, ExtractorConfig, SimulatedCollaborator};
use crate::{Result, TrackerError};

/// On-disk TOML structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub extractor: Option<ExtractorSection>,
    pub csv: Option<CsvSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractorSection {
    pub max_input_len: Option<usize>,
    pub external_timeout_secs: Option<u64>,
    pub simulated_latency_ms: Option<u64>,
    pub heuristic_fallback: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvSection {
    pub max_rows: Option<usize>,
    pub max_bytes: Option<usize>,
    pub max_field_len: Option<usize>,
}

/// Settings for every configurable part of the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    pub extractor: ExtractorConfig,
    #[cfg(feature = "csv")]
    pub csv: CsvConfig,
}

impl TrackerConfig {
    /// Parses TOML text, filling missing keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] for malformed TOML, unknown keys, or
    /// a zero limit.
    ///
    /// # Examples
    ///
    /// ```
    /// use papertrack::TrackerConfig;
    /// use std::time::Duration;
    ///
    /// let config = TrackerConfig::from_toml_str("[extractor]\nexternal_timeout_secs = 5\n").unwrap();
    /// assert_eq!(config.extractor.external_timeout(), Duration::from_secs(5));
    /// assert_eq!(config.extractor.max_input_len(), 10_000);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(input)?;
        Self::from_file(file)
    }

    /// Loads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`TrackerConfig::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Merges a parsed file over the defaults.
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(section) = file.extractor {
            let extractor = &mut config.extractor;
            if let Some(max) = section.max_input_len {
                extractor.set_max_input_len(non_zero("extractor.max_input_len", max)?);
            }
            if let Some(secs) = section.external_timeout_secs {
                let secs = non_zero("extractor.external_timeout_secs", secs)?;
                extractor.set_external_timeout(Duration::from_secs(secs));
            }
            if let Some(ms) = section.simulated_latency_ms {
                extractor.set_simulated_latency(Duration::from_millis(ms));
            }
            if let Some(enabled) = section.heuristic_fallback {
                extractor.set_heuristic_fallback(enabled);
            }
        }

        #[cfg(feature = "csv")]
        if let Some(section) = file.csv {
            let csv = &mut config.csv;
            if let Some(max) = section.max_rows {
                csv.set_max_rows(non_zero("csv.max_rows", max)?);
            }
            if let Some(max) = section.max_bytes {
                csv.set_max_bytes(non_zero("csv.max_bytes", max)?);
            }
            if let Some(max) = section.max_field_len {
                csv.set_max_field_len(non_zero("csv.max_field_len", max)?);
            }
        }

        Ok(config)
    }

    /// An extractor using these settings.
    pub fn extractor(&self) -> Extractor {
        Extractor::new().with_config(self.extractor.clone())
    }

    /// A simulated assistant with the configured latency.
    pub fn simulated_collaborator(&self) -> SimulatedCollaborator {
        SimulatedCollaborator::new(self.extractor.simulated_latency())
    }

    /// A CSV importer using these limits.
    #[cfg(feature = "csv")]
    pub fn csv_importer(&self) -> CsvImporter {
        CsvImporter::new().with_config(self.csv.clone())
    }
}

fn non_zero<T: PartialEq + Default>(key: &str, value: T) -> Result<T> {
    if value == T::default() {
        return Err(TrackerError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}
