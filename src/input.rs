//! Input loading and option validation.
//!
//! Every check here runs before any decoding happens, so a bad request never
//! costs a codec call. All failures are [`Error::Validation`].

use crate::error::{Error, Result};
use crate::imaging::{OutputFormat, Quality, is_valid_scale, supported_input_extensions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an image comes from: a file on disk or bytes already in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        ImageInput::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageInput {
    fn from(bytes: &[u8]) -> Self {
        ImageInput::Bytes(bytes.to_vec())
    }
}

impl ImageInput {
    /// Validate and read the input into memory.
    pub fn load(self) -> Result<Vec<u8>> {
        match self {
            ImageInput::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(Error::validation("input buffer is empty"));
                }
                Ok(bytes)
            }
            ImageInput::Path(path) => read_input_file(&path),
        }
    }
}

/// Whether `path` has one of the decodable input extensions (case-insensitive).
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

fn read_input_file(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(Error::validation("no input path given"));
    }
    if !path.is_file() {
        return Err(Error::validation(format!(
            "input file not found: {}",
            path.display()
        )));
    }
    if !has_supported_extension(path) {
        return Err(Error::validation(format!(
            "unsupported input extension for {} (expected one of: {})",
            path.display(),
            supported_input_extensions().join(", ")
        )));
    }
    let bytes = std::fs::read(path).map_err(|e| {
        Error::validation(format!("cannot read {}: {e}", path.display()))
    })?;
    if bytes.is_empty() {
        return Err(Error::validation(format!(
            "input file is empty: {}",
            path.display()
        )));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "loaded input");
    Ok(bytes)
}

/// Accept a user-supplied quality in 1–100.
pub fn validate_quality(value: u32) -> Result<Quality> {
    Quality::try_new(value).ok_or_else(|| {
        Error::validation(format!("invalid quality {value}: must be between 1 and 100"))
    })
}

/// Accept an upscale factor of 2 or 4.
pub fn validate_scale(scale: u32) -> Result<u32> {
    if is_valid_scale(scale) {
        Ok(scale)
    } else {
        Err(Error::validation(format!(
            "invalid scale {scale}: must be 2 or 4"
        )))
    }
}

/// Parse an output format name, rejecting anything we cannot encode.
pub fn parse_format(name: &str) -> Result<OutputFormat> {
    name.parse().map_err(|e: crate::imaging::UnknownFormat| Error::validation(e.to_string()))
}

/// Restrict a format to an allowed subset for a particular command.
pub fn require_format(format: OutputFormat, allowed: &[OutputFormat], command: &str) -> Result<()> {
    if allowed.contains(&format) {
        Ok(())
    } else {
        let names: Vec<String> = allowed.iter().map(|f| f.to_string()).collect();
        Err(Error::validation(format!(
            "{command} cannot write {format} (expected one of: {})",
            names.join(", ")
        )))
    }
}

/// Check that `output` can be created: its directory must exist and be writable.
pub fn validate_output_path(output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let meta = std::fs::metadata(dir).map_err(|_| {
        Error::validation(format!("output directory does not exist: {}", dir.display()))
    })?;
    if !meta.is_dir() {
        return Err(Error::validation(format!(
            "output parent is not a directory: {}",
            dir.display()
        )));
    }
    if meta.permissions().readonly() {
        return Err(Error::validation(format!(
            "output directory is not writable: {}",
            dir.display()
        )));
    }
    Ok(())
}
