use std::path::PathBuf;
use thiserror::Error;

/// Error type for the forcing pipeline.
///
/// Every variant is fatal; the driver wraps failures in [`TideCellError::Stage`]
/// so the message names the stage and the file involved.
#[derive(Error, Debug)]
pub enum TideCellError {
    #[error("Failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    #[error("Site series are misaligned: {0}")]
    Alignment(String),
    #[error("Cannot substitute {field} year {target} with year {source_year}: {target_len} rows vs {source_len} rows")]
    ShapeMismatch {
        field: String,
        target: i32,
        source_year: i32,
        target_len: usize,
        source_len: usize,
    },
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("NetCDF support is not enabled in this build")]
    FeatureDisabled,
    #[error("{stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<TideCellError>,
    },
}

impl TideCellError {
    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Attach the name of the pipeline stage that produced this error
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }
}

/// Convenience type for `Result<T, TideCellError>`.
pub type TideCellResult<T> = Result<T, TideCellError>;
