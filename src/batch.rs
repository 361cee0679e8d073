//! Directory batch mode.
//!
//! When a command is pointed at a directory, every decodable image inside it
//! is processed one after another. Items are independent: a failure is
//! recorded against that file and the run moves on. Ordering is by path, so
//! two runs over the same tree visit files identically.

use crate::error::{Error, Result};
use crate::input::has_supported_extension;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Find the images to process under `path`.
///
/// A file is returned as-is (its extension is checked later, on load). A
/// directory is scanned for supported extensions, one level deep unless
/// `recursive` is set. An empty directory is a validation error.
pub fn collect_inputs(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(Error::validation(format!(
            "input not found: {}",
            path.display()
        )));
    }

    let walker = if recursive {
        WalkDir::new(path).follow_links(true)
    } else {
        WalkDir::new(path).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_supported_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::validation(format!(
            "no supported images in {}",
            path.display()
        )));
    }
    Ok(files)
}

/// Default output location: `<stem>-<suffix>.<ext>` next to the input, or
/// inside `output_dir` when one is given.
///
/// ```
/// use pixkit::batch::output_path_for;
/// use std::path::Path;
///
/// let out = output_path_for(Path::new("shots/cat.jpg"), None, "2x", "png");
/// assert_eq!(out, Path::new("shots/cat-2x.png"));
/// ```
pub fn output_path_for(input: &Path, output_dir: Option<&Path>, suffix: &str, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = format!("{stem}-{suffix}.{ext}");
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Outcome for one input file.
#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub input: PathBuf,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum ItemOutcome {
    Written { output: PathBuf },
    Failed { error: String },
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Written { .. })
    }
}

/// Results of a whole batch, in input order.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|i| !i.is_success())
    }
}

/// Progress callback: `(items done, total, item just finished)`.
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize, &BatchItem);

/// Run `job` over every input, sequentially.
///
/// `job` returns the path it wrote. Errors are captured per item and never
/// abort the batch.
pub fn run_batch<F>(inputs: &[PathBuf], mut job: F, mut progress: Option<Progress<'_>>) -> BatchReport
where
    F: FnMut(&Path) -> Result<PathBuf>,
{
    let total = inputs.len();
    let mut report = BatchReport::default();

    for (i, input) in inputs.iter().enumerate() {
        let outcome = match job(input) {
            Ok(output) => ItemOutcome::Written { output },
            Err(e) => {
                warn!(input = %input.display(), error = %e, "batch item failed");
                ItemOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        let item = BatchItem {
            input: input.clone(),
            outcome,
        };
        if let Some(cb) = progress.as_mut() {
            cb(i + 1, total, &item);
        }
        report.items.push(item);
    }

    info!(
        total,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn collect_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.png");
        touch(tmp.path(), "a.JPG");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "nested/c.webp");

        let files = collect_inputs(tmp.path(), false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }

    #[test]
    fn collect_recursive_descends() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.png");
        touch(tmp.path(), "nested/c.webp");
        assert_eq!(collect_inputs(tmp.path(), true).unwrap().len(), 2);
    }

    #[test]
    fn collect_single_file_passes_through() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "photo.bmp");
        assert_eq!(collect_inputs(&file, false).unwrap(), vec![file]);
    }

    #[test]
    fn collect_empty_dir_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "readme.md");
        assert!(collect_inputs(tmp.path(), false).unwrap_err().is_validation());
    }

    #[test]
    fn collect_missing_path_errors() {
        assert!(collect_inputs(Path::new("/nonexistent/dir"), false).is_err());
    }

    #[test]
    fn output_path_in_output_dir() {
        let out = output_path_for(
            Path::new("/in/photo.jpeg"),
            Some(Path::new("/out")),
            "nobg",
            "png",
        );
        assert_eq!(out, PathBuf::from("/out/photo-nobg.png"));
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let inputs: Vec<PathBuf> = ["one.png", "two.png", "three.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let mut seen = Vec::new();
        let mut progress = |done: usize, total: usize, item: &BatchItem| {
            seen.push((done, total, item.is_success()));
        };

        let report = run_batch(
            &inputs,
            |p| {
                if p == Path::new("two.png") {
                    Err(Error::validation("broken"))
                } else {
                    Ok(p.with_extension("webp"))
                }
            },
            Some(&mut progress),
        );

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(seen, vec![(1, 3, true), (2, 3, false), (3, 3, true)]);

        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed[0].input, PathBuf::from("two.png"));
        assert!(matches!(
            &failed[0].outcome,
            ItemOutcome::Failed { error } if error.contains("broken")
        ));
    }

    #[test]
    fn report_serializes_with_status_tag() {
        let report = BatchReport {
            items: vec![BatchItem {
                input: PathBuf::from("a.png"),
                outcome: ItemOutcome::Written {
                    output: PathBuf::from("a-2x.png"),
                },
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][0]["status"], "written");
        assert_eq!(json["items"][0]["output"], "a-2x.png");
    }
}
