//! CLI output formatting.
//!
//! Each command has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## compress
//!
//! ```text
//! photo.jpg → photo-compressed.webp
//!     webp q87 (estimated, photographic, complexity 0.62)
//!     2.4 MB → 612.0 KB (-75%)
//! ```
//!
//! ## upscale
//!
//! ```text
//! photo.jpg → photo-2x.png
//!     640x480 → 1280x960 (2x)
//! ```
//!
//! ## batch
//!
//! ```text
//! [1/3] ✓ a.jpg → a-2x.png
//! [2/3] ✗ b.jpg: Invalid input: input file is empty: b.jpg
//! [3/3] ✓ c.jpg → c-2x.png
//! Processed 3 images: 2 succeeded, 1 failed
//! ```
//!
//! `--json` replaces all of this with a single serialised report.

use crate::batch::{BatchItem, BatchReport, ItemOutcome};
use crate::error::{Error, Result};
use crate::imaging::{OUTPUT_FORMAT_NAMES, UPSCALE_FACTORS, supported_input_extensions};
use crate::processor::{CompressOutput, UpscaleOutput};
use console::style;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

const INDENT: &str = "    ";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

fn arrow_line(input: Option<&Path>, output: &Path) -> String {
    match input {
        Some(input) => format!("{} → {}", file_name(input), output.display()),
        None => format!("→ {}", output.display()),
    }
}

// ============================================================================
// info
// ============================================================================

/// Static description of what this build can do.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub features: Vec<&'static str>,
    pub input_extensions: Vec<&'static str>,
    pub output_formats: Vec<&'static str>,
    pub upscale_factors: Vec<u32>,
    pub segmentation_strategy: &'static str,
}

pub fn tool_info(segmentation_strategy: &'static str) -> ToolInfo {
    ToolInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        features: vec!["remove-bg", "upscale", "compress", "enhance"],
        input_extensions: supported_input_extensions().to_vec(),
        output_formats: OUTPUT_FORMAT_NAMES.to_vec(),
        upscale_factors: UPSCALE_FACTORS.to_vec(),
        segmentation_strategy,
    }
}

pub fn format_info(info: &ToolInfo) -> Vec<String> {
    vec![
        format!("{} {}", info.name, info.version),
        String::new(),
        "Features".to_string(),
        format!("{INDENT}{}", info.features.join(", ")),
        "Input".to_string(),
        format!("{INDENT}{}", info.input_extensions.join(", ")),
        "Output".to_string(),
        format!("{INDENT}{}", info.output_formats.join(", ")),
        "Upscale".to_string(),
        format!(
            "{INDENT}{}",
            info.upscale_factors
                .iter()
                .map(|f| format!("{f}x"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        "Background".to_string(),
        format!("{INDENT}{} mask", info.segmentation_strategy),
    ]
}

pub fn print_info(info: &ToolInfo) {
    for line in format_info(info) {
        println!("{line}");
    }
}

// ============================================================================
// Single-image results
// ============================================================================

pub fn format_compress_result(input: Option<&Path>, output: &Path, result: &CompressOutput) -> Vec<String> {
    let how = match &result.report {
        Some(r) => format!(
            "estimated, {}, complexity {:.2}",
            if r.is_photographic { "photographic" } else { "graphic" },
            r.complexity_score
        ),
        None => "fixed".to_string(),
    };
    let saved = if result.original_size > 0 {
        let ratio = result.compressed_size as f64 / result.original_size as f64;
        format!(" ({:+.0}%)", (ratio - 1.0) * 100.0)
    } else {
        String::new()
    };
    vec![
        arrow_line(input, output),
        format!("{INDENT}{} q{} ({how})", result.format, result.quality),
        format!(
            "{INDENT}{} → {}{saved}",
            format_size(result.original_size),
            format_size(result.compressed_size)
        ),
    ]
}

pub fn format_upscale_result(input: Option<&Path>, output: &Path, result: &UpscaleOutput) -> Vec<String> {
    vec![
        arrow_line(input, output),
        format!(
            "{INDENT}{}x{} → {}x{} ({}x)",
            result.original_width,
            result.original_height,
            result.new_width,
            result.new_height,
            result.scale
        ),
    ]
}

/// One-line result for commands that only report where they wrote.
pub fn format_written(input: Option<&Path>, output: &Path) -> Vec<String> {
    vec![arrow_line(input, output)]
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// Serialise `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::processing("output", e))?;
    println!("{json}");
    Ok(())
}

// ============================================================================
// Batch
// ============================================================================

pub fn format_batch_progress(done: usize, total: usize, item: &BatchItem) -> String {
    match &item.outcome {
        ItemOutcome::Written { output } => format!(
            "[{done}/{total}] {} {} → {}",
            style("✓").green(),
            file_name(&item.input),
            output.display()
        ),
        ItemOutcome::Failed { error } => format!(
            "[{done}/{total}] {} {}: {error}",
            style("✗").red(),
            file_name(&item.input)
        ),
    }
}

pub fn format_batch_summary(report: &BatchReport) -> String {
    let noun = if report.total() == 1 { "image" } else { "images" };
    format!(
        "Processed {} {noun}: {} succeeded, {} failed",
        report.total(),
        report.succeeded(),
        report.failed()
    )
}

// ============================================================================
// Errors
// ============================================================================

/// The single stderr line shown when a command fails.
pub fn format_error(err: &Error) -> String {
    format!("{} {err}", style("✗").red().bold())
}

pub fn print_error(err: &Error) {
    eprintln!("{}", format_error(err));
}
