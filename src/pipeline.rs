//! Linear stage sequencing for `enhance`.
//!
//! A pipeline is an ordered list of [`Stage`]s. The [`Sequencer`] runs them
//! strictly left to right, handing each stage's output bytes to the next
//! stage as its only input. There is no reordering, no parallelism, no retry
//! and no partial result: the first failing stage ends the run.
//!
//! ```text
//! Pending ──execute──▶ Running(0) ──ok──▶ Running(1) ──ok──▶ … ──▶ Completed
//!                          │                  │
//!                          └──err──▶ Failed { stage, cause } ◀──err──┘
//! ```
//!
//! ## Task names
//!
//! Inside the crate a stage is always a [`Stage`] value. Free text (the
//! `--tasks` flag, the `[enhance]` config section) is parsed into [`Task`]s,
//! which may be [`Task::Unknown`]. An unknown task is only rejected when the
//! sequencer reaches it, so earlier stages still run first.

use crate::error::{Error, Result};
use crate::imaging::{OutputFormat, Quality};
use std::fmt;
use tracing::{debug, warn};

/// One image transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RemoveBackground,
    Upscale {
        scale: u32,
    },
    Compress {
        format: OutputFormat,
        /// Fixed quality; `None` estimates one from the image.
        quality: Option<Quality>,
    },
}

impl Stage {
    /// Task name as written on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::RemoveBackground => "remove-bg",
            Stage::Upscale { .. } => "upscale",
            Stage::Compress { .. } => "compress",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::RemoveBackground => f.write_str("remove-bg"),
            Stage::Upscale { scale } => write!(f, "upscale ×{scale}"),
            Stage::Compress {
                format,
                quality: Some(q),
            } => write!(f, "compress → {format} q{}", q.value()),
            Stage::Compress {
                format,
                quality: None,
            } => write!(f, "compress → {format} (auto quality)"),
        }
    }
}

/// A parsed task name: either a known stage or the raw unrecognised text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Stage(Stage),
    Unknown(String),
}

impl Task {
    pub fn name(&self) -> &str {
        match self {
            Task::Stage(stage) => stage.name(),
            Task::Unknown(name) => name,
        }
    }

    /// Turn the task into a runnable stage, failing for unknown names.
    pub fn resolve(&self) -> Result<Stage> {
        match self {
            Task::Stage(stage) => Ok(*stage),
            Task::Unknown(name) => Err(Error::UnknownTask(name.clone())),
        }
    }
}

/// Parameters filled into stages parsed from bare task names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefaults {
    pub scale: u32,
    pub format: OutputFormat,
    pub quality: Option<Quality>,
}

/// Parse one task name (case-insensitive, surrounding whitespace ignored).
pub fn parse_task(name: &str, defaults: &StageDefaults) -> Task {
    match name.trim().to_ascii_lowercase().as_str() {
        "remove-bg" | "removebg" | "remove-background" => Task::Stage(Stage::RemoveBackground),
        "upscale" => Task::Stage(Stage::Upscale {
            scale: defaults.scale,
        }),
        "compress" => Task::Stage(Stage::Compress {
            format: defaults.format,
            quality: defaults.quality,
        }),
        _ => Task::Unknown(name.trim().to_string()),
    }
}

/// Parse a list of task names. Empty entries are skipped.
pub fn parse_tasks<S: AsRef<str>>(names: &[S], defaults: &StageDefaults) -> Vec<Task> {
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| !n.trim().is_empty())
        .map(|n| parse_task(n, defaults))
        .collect()
}

/// Something that can execute a single stage on encoded image bytes.
pub trait StageRunner {
    fn run_stage(&self, stage: &Stage, input: Vec<u8>) -> Result<Vec<u8>>;
}

/// Where a sequencer is in its run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Pending,
    Running(usize),
    Completed,
    Failed {
        stage: usize,
        cause: String,
    },
}

/// Runs a pipeline once, tracking its [`PipelineState`].
#[derive(Debug, Default)]
pub struct Sequencer {
    state: PipelineState,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Run `stages` in order. An empty list returns `input` unchanged.
    pub fn execute(
        &mut self,
        runner: &impl StageRunner,
        input: Vec<u8>,
        stages: Vec<Stage>,
    ) -> Result<Vec<u8>> {
        self.run(
            runner,
            input,
            stages.into_iter().map(|s| (s.name().to_string(), Ok(s))),
        )
    }

    /// Run parsed tasks in order, resolving each one only when it is reached.
    pub fn execute_tasks(
        &mut self,
        runner: &impl StageRunner,
        input: Vec<u8>,
        tasks: Vec<Task>,
    ) -> Result<Vec<u8>> {
        self.run(
            runner,
            input,
            tasks.into_iter().map(|t| (t.name().to_string(), t.resolve())),
        )
    }

    fn run(
        &mut self,
        runner: &impl StageRunner,
        input: Vec<u8>,
        stages: impl Iterator<Item = (String, Result<Stage>)>,
    ) -> Result<Vec<u8>> {
        let mut current = input;
        for (index, (name, stage)) in stages.enumerate() {
            self.state = PipelineState::Running(index);
            debug!(index, stage = %name, bytes = current.len(), "running stage");

            match stage.and_then(|stage| runner.run_stage(&stage, current)) {
                Ok(output) => current = output,
                Err(source) => {
                    warn!(index, stage = %name, error = %source, "stage failed");
                    self.state = PipelineState::Failed {
                        stage: index,
                        cause: source.to_string(),
                    };
                    return Err(Error::Stage {
                        index,
                        stage: name,
                        source: Box::new(source),
                    });
                }
            }
        }
        self.state = PipelineState::Completed;
        Ok(current)
    }
}
