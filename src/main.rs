use clap::{Parser, Subcommand};
use pixkit::batch::{BatchItem, collect_inputs, output_path_for, run_batch};
use pixkit::config::{self, ToolConfig};
use pixkit::imaging::OutputFormat;
use pixkit::input::parse_format;
use pixkit::pipeline::{Stage, Task, parse_tasks};
use pixkit::{
    BackgroundOptions, CompressOptions, EnhanceOptions, Error, Processor, Result, UpscaleOptions,
    logging, output,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pixkit")]
#[command(about = "Remove backgrounds, upscale and compress images locally")]
#[command(long_about = "\
Remove backgrounds, upscale and compress images locally

Everything runs on this machine: no network, no models to download.

Commands take a single image or a directory. With a directory every
jpg, jpeg, png, webp, tiff and bmp file inside it is processed in turn
and -o names the output directory.

Default output names sit next to the input:
  photo.jpg  remove-bg  →  photo-nobg.png
  photo.jpg  upscale    →  photo-2x.png
  photo.jpg  compress   →  photo-compressed.webp
  photo.jpg  enhance    →  photo-enhanced.webp

Run 'pixkit gen-config' to generate a documented pixkit.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./pixkit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

/// Input and output locations shared by the image commands.
#[derive(clap::Args, Clone)]
struct Target {
    /// Image file or directory of images
    input: PathBuf,

    /// Output file (or directory, in batch mode)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Descend into subdirectories in batch mode
    #[arg(short, long)]
    recursive: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fade the background to transparent (always writes PNG)
    RemoveBg {
        #[command(flatten)]
        target: Target,
        /// png or webp
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Enlarge 2x or 4x with Lanczos resampling and light sharpening
    Upscale {
        #[command(flatten)]
        target: Target,
        /// 2 or 4
        #[arg(short, long)]
        scale: Option<u32>,
        /// jpg, png or webp
        #[arg(short, long)]
        format: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-encode, estimating a quality when none is given
    Compress {
        #[command(flatten)]
        target: Target,
        /// 1-100 (default: estimated per image)
        #[arg(short, long)]
        quality: Option<u32>,
        /// webp, avif, jpeg or png
        #[arg(short, long)]
        format: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run several tasks in order: remove-bg, upscale, compress
    Enhance {
        #[command(flatten)]
        target: Target,
        /// Comma-separated task list (default from config: upscale,compress)
        #[arg(short, long, value_delimiter = ',')]
        tasks: Option<Vec<String>>,
        /// Upscale factor for the upscale task
        #[arg(short, long)]
        scale: Option<u32>,
        /// Quality for the compress task
        #[arg(short, long)]
        quality: Option<u32>,
        /// Output format for the compress task
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Show features and supported formats
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock pixkit.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let loaded = load_cli_config(cli.config.as_deref());

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
        Command::Info { json } => {
            // info never fails: a broken config only changes what it reports
            let config = loaded.unwrap_or_else(|e| {
                eprintln!("{}", output::format_error(&e));
                ToolConfig::default()
            });
            logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);
            let processor = Processor::new(config);
            let info = output::tool_info(processor.strategy_name());
            if json {
                if let Err(e) = output::print_json(&info) {
                    eprintln!("{}", output::format_error(&e));
                }
            } else {
                output::print_info(&info);
            }
            Ok(())
        }
        command => {
            let config = loaded?;
            logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);
            run_image_command(command, Processor::new(config))
        }
    }
}

fn load_cli_config(path: Option<&Path>) -> Result<ToolConfig> {
    let config = match path {
        Some(p) => config::load_config_file(p)?,
        None => config::load_config(Path::new("."))?,
    };
    Ok(config)
}

fn parse_format_flag(format: Option<&str>) -> Result<Option<OutputFormat>> {
    format.map(parse_format).transpose()
}

fn run_image_command(command: Command, processor: Processor) -> Result<()> {
    match command {
        Command::RemoveBg { target, format } => {
            let options = BackgroundOptions {
                format: parse_format_flag(format.as_deref())?,
            };
            dispatch(
                &target,
                "nobg",
                OutputFormat::Png,
                false,
                |input, out| {
                    processor.write_to(out, |p| p.remove_background(input, &options))?;
                    Ok(())
                },
                |input, out, _| output::format_written(Some(input), out),
            )
        }
        Command::Upscale {
            target,
            scale,
            format,
            json,
        } => {
            let scale = scale.unwrap_or(processor.config().upscale.scale);
            let options = UpscaleOptions {
                format: parse_format_flag(format.as_deref())?.or(format_from_output(&target)),
            };
            let ext = options.format.unwrap_or(processor.config().upscale.format);
            dispatch(
                &target,
                &format!("{scale}x"),
                ext,
                json,
                |input, out| processor.write_to(out, |p| p.upscale(input, scale, &options)),
                |input, out, r| output::format_upscale_result(Some(input), out, r),
            )
        }
        Command::Compress {
            target,
            quality,
            format,
            json,
        } => {
            let mut options = CompressOptions::parse(format.as_deref(), quality)?;
            options.format = options.format.or(format_from_output(&target));
            let ext = options.format.unwrap_or(processor.config().compress.format);
            dispatch(
                &target,
                "compressed",
                ext,
                json,
                |input, out| processor.write_to(out, |p| p.compress(input, &options)),
                |input, out, r| output::format_compress_result(Some(input), out, r),
            )
        }
        Command::Enhance {
            target,
            tasks,
            scale,
            quality,
            format,
        } => {
            let options = EnhanceOptions {
                tasks,
                scale,
                quality,
                format: parse_format_flag(format.as_deref())?.or(format_from_output(&target)),
                output: None,
            };
            let ext = enhance_output_format(&processor, &options)?;
            dispatch(
                &target,
                "enhanced",
                ext,
                false,
                |input, out| {
                    let options = EnhanceOptions {
                        output: Some(out.to_path_buf()),
                        ..options.clone()
                    };
                    processor.enhance(input, &options)?;
                    Ok(())
                },
                |input, out, _| output::format_written(Some(input), out),
            )
        }
        Command::Info { .. } | Command::GenConfig => Ok(()),
    }
}

/// Format named by the extension of a single-file `-o`, used when `-f` is absent.
fn format_from_output(target: &Target) -> Option<OutputFormat> {
    target
        .output
        .as_deref()
        .filter(|o| !target.input.is_dir() && !o.is_dir())
        .and_then(OutputFormat::from_path)
}

/// Format written by the last recognised task, used to name the output file.
fn enhance_output_format(processor: &Processor, options: &EnhanceOptions) -> Result<OutputFormat> {
    let config = processor.config();
    let defaults = processor.stage_defaults(options)?;
    let names = options.tasks.as_deref().unwrap_or(config.enhance.tasks.as_slice());
    let last = parse_tasks(names, &defaults)
        .into_iter()
        .rev()
        .find_map(|task| match task {
            Task::Stage(stage) => Some(stage),
            Task::Unknown(_) => None,
        });
    Ok(match last {
        Some(Stage::Compress { format, .. }) => format,
        Some(Stage::Upscale { .. }) => config.upscale.format,
        _ => OutputFormat::Png,
    })
}

/// Run `job` on a single file, or on every image in a directory.
///
/// `job` receives the input and the planned output path; `render` turns its
/// result into the lines printed in single-file mode.
fn dispatch<R, J, F>(
    target: &Target,
    suffix: &str,
    format: OutputFormat,
    json: bool,
    job: J,
    render: F,
) -> Result<()>
where
    R: Serialize,
    J: Fn(&Path, &Path) -> Result<R>,
    F: Fn(&Path, &Path, &R) -> Vec<String>,
{
    let ext = format.extension();

    if !target.input.is_dir() {
        let out = match &target.output {
            Some(o) if o.is_dir() => output_path_for(&target.input, Some(o), suffix, ext),
            Some(o) => o.clone(),
            None => output_path_for(&target.input, None, suffix, ext),
        };
        let result = job(&target.input, &out)?;
        if json {
            output::print_json(&result)?;
        } else {
            output::print_lines(&render(&target.input, &out, &result));
        }
        return Ok(());
    }

    let inputs = collect_inputs(&target.input, target.recursive)?;
    if let Some(dir) = &target.output {
        std::fs::create_dir_all(dir)?;
    }
    let mut progress = |done: usize, total: usize, item: &BatchItem| {
        if !json {
            println!("{}", output::format_batch_progress(done, total, item));
        }
    };
    let report = run_batch(
        &inputs,
        |input| {
            let out = output_path_for(input, target.output.as_deref(), suffix, ext);
            job(input, &out)?;
            Ok(out)
        },
        Some(&mut progress),
    );

    if json {
        output::print_json(&report)?;
    } else {
        println!("{}", output::format_batch_summary(&report));
    }
    if report.failed() > 0 {
        return Err(Error::processing(
            "batch",
            format!("{} of {} images failed", report.failed(), report.total()),
        ));
    }
    Ok(())
}
