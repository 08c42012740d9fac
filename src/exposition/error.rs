//! Error types for the protobuf exposition path

use std::num::ParseFloatError;

use crate::metrics::Sample;

/// Fatal errors while writing metric families
///
/// Each one aborts the family being processed. Bytes of earlier families
/// that already reached the sink stay there.
#[derive(Debug)]
pub enum FormatError {
    /// A `quantile`/`le` label value is neither a special token nor a float
    InvalidParticle {
        family: String,
        label: &'static str,
        value: String,
        source: ParseFloatError,
    },
    /// A sample has a different number of label names and label values
    UnpairedLabels {
        family: String,
        sample: String,
        names: usize,
        values: usize,
    },
    /// Protobuf encoding failed
    Encode(prost::EncodeError),
    /// The sink rejected a write
    Io(std::io::Error),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::InvalidParticle {
                family,
                label,
                value,
                source,
            } => write!(
                f,
                "Invalid {} label value {:?} in family {}: {}",
                label, value, family, source
            ),
            FormatError::UnpairedLabels {
                family,
                sample,
                names,
                values,
            } => write!(
                f,
                "Sample {} in family {} has {} label names but {} label values",
                sample, family, names, values
            ),
            FormatError::Encode(e) => write!(f, "Protobuf encoding error: {}", e),
            FormatError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::InvalidParticle { source, .. } => Some(source),
            FormatError::UnpairedLabels { .. } => None,
            FormatError::Encode(e) => Some(e),
            FormatError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for FormatError {
    fn from(e: std::io::Error) -> Self {
        FormatError::Io(e)
    }
}

impl From<prost::EncodeError> for FormatError {
    fn from(e: prost::EncodeError) -> Self {
        FormatError::Encode(e)
    }
}

/// Reject a sample whose label names and values do not pair up
pub(crate) fn ensure_paired(family: &str, sample: &Sample) -> Result<(), FormatError> {
    if sample.is_paired() {
        return Ok(());
    }
    Err(FormatError::UnpairedLabels {
        family: family.to_string(),
        sample: sample.name.clone(),
        names: sample.label_names.len(),
        values: sample.label_values.len(),
    })
}

/// Errors while loading formatter configuration
#[derive(Debug)]
pub enum ConfigError {
    /// TOML document could not be parsed into a config
    Toml(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Toml(e) => write!(f, "Invalid formatter config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Toml(e) => Some(e),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e)
    }
}
