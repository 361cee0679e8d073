//! Crate-wide error type.
//!
//! | Variant | Raised when |
//! |---|---|
//! | [`Error::Validation`] | Bad input, option or output location. Always before any pixel work. |
//! | [`Error::Processing`] | The codec failed or an internal consistency check tripped. |
//! | [`Error::UnknownTask`] | A task name parsed from text matches no stage. |
//! | [`Error::Stage`] | Any of the above, raised while a pipeline stage was running. |

use crate::config::ConfigError;
use crate::imaging::BackendError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{stage} failed: {message}")]
    Processing { stage: &'static str, message: String },
    #[error("Unknown task '{0}' (expected one of: remove-bg, upscale, compress)")]
    UnknownTask(String),
    #[error("Stage {} ({stage}) failed: {source}", .index + 1)]
    Stage {
        /// Zero-based position in the pipeline.
        index: usize,
        stage: String,
        #[source]
        source: Box<Error>,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Wrap a codec failure, naming the operation it happened in.
    pub fn processing(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Processing {
            stage,
            message: err.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        match self {
            Error::Validation(_) => true,
            Error::Stage { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// Zero-based index of the pipeline stage that failed, if any.
    pub fn failed_stage(&self) -> Option<usize> {
        match self {
            Error::Stage { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Backend errors surface as processing errors of the operation that hit them.
pub(crate) trait BackendResultExt<T> {
    fn in_stage(self, stage: &'static str) -> Result<T>;
}

impl<T> BackendResultExt<T> for std::result::Result<T, BackendError> {
    fn in_stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|e| Error::processing(stage, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_is_one_based_in_message() {
        let err = Error::Stage {
            index: 1,
            stage: "upscale".into(),
            source: Box::new(Error::processing("upscale", "boom")),
        };
        assert_eq!(err.to_string(), "Stage 2 (upscale) failed: upscale failed: boom");
        assert_eq!(err.failed_stage(), Some(1));
    }

    #[test]
    fn validation_is_detected_through_stage_wrapper() {
        let err = Error::Stage {
            index: 0,
            stage: "upscale".into(),
            source: Box::new(Error::validation("scale must be 2 or 4")),
        };
        assert!(err.is_validation());
        assert!(!Error::UnknownTask("sharpen".into()).is_validation());
    }

    #[test]
    fn backend_errors_name_the_stage() {
        let res: std::result::Result<(), BackendError> =
            Err(BackendError::ProcessingFailed("bad data".into()));
        let err = res.in_stage("compress").unwrap_err();
        assert_eq!(err.to_string(), "compress failed: Processing failed: bad data");
    }
}
