//! Command-line interface components.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use tracing::debug;

use crate::config::{DepthSlice, ExportConfig, ReaderConfig, VariableSelection};
use crate::models::{FormatTag, ProcessingStats};
use crate::processor::CastProcessor;
use crate::render::{CastSink, CsvRenderer, DumpRenderer};

#[derive(Parser, Debug)]
#[command(name = "wod")]
#[command(about = "Decode World Ocean Database native ASCII casts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every block of each cast as a text report
    Dump(DumpArgs),
    /// Export casts as a CSV depth matrix (WOD13 files only)
    Csv(CsvArgs),
}

/// Input and output shared by all commands
#[derive(clap::Args, Debug, Clone)]
pub struct IoArgs {
    /// WOD native ASCII file (prompted for if omitted)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of casts to process, 0 for all
    #[arg(short = 'n', long = "casts", default_value_t = 0)]
    pub casts: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DumpArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Leave undeclared depths of legacy standard-level casts unfilled
    #[arg(long)]
    pub no_backfill: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CsvArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Variable code to export (1-43), 0 for all
    #[arg(long, default_value_t = 0)]
    pub variable: i32,

    /// Which levels of each cast to write
    #[arg(long, value_enum, default_value_t = DepthChoice::All)]
    pub depths: DepthChoice,

    /// Shallowest depth (m) written with `--depths interval`
    #[arg(long)]
    pub min_depth: Option<f64>,

    /// Deepest depth (m) written with `--depths interval`
    #[arg(long)]
    pub max_depth: Option<f64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthChoice {
    All,
    Surface,
    Bottom,
    Interval,
}

impl Args {
    /// Get log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    pub fn io(&self) -> &IoArgs {
        match &self.command {
            Command::Dump(args) => &args.io,
            Command::Csv(args) => &args.io,
        }
    }
}

impl DumpArgs {
    pub fn export_config(&self) -> ExportConfig {
        let config = ExportConfig::default().with_max_casts(self.io.casts);
        if self.no_backfill {
            config.without_backfill()
        } else {
            config
        }
    }
}

impl CsvArgs {
    pub fn export_config(&self) -> Result<ExportConfig> {
        let depth_slice = match self.depths {
            DepthChoice::All => DepthSlice::All,
            DepthChoice::Surface => DepthSlice::Surface,
            DepthChoice::Bottom => DepthSlice::Bottom,
            DepthChoice::Interval => match (self.min_depth, self.max_depth) {
                (Some(min), Some(max)) => DepthSlice::Interval { min, max },
                _ => bail!("--depths interval requires --min-depth and --max-depth"),
            },
        };
        let config = ExportConfig::default()
            .with_max_casts(self.io.casts)
            .with_variable(VariableSelection::from_code(self.variable))
            .with_depth_slice(depth_slice);
        config.validate()?;
        Ok(config)
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wod_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Ask for an input file name on the terminal
pub fn prompt_for_input() -> Result<PathBuf> {
    eprint!("{}", "Enter WOD ASCII file name: ".bright_white());
    io::stderr().flush().context("Failed to flush stderr")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;

    let name = input.trim();
    if name.is_empty() {
        bail!("No input file given");
    }
    Ok(PathBuf::from(name))
}

/// Run the selected command and return its statistics
pub fn run(args: &Args) -> Result<ProcessingStats> {
    let io_args = args.io();
    let input = match &io_args.input {
        Some(path) => path.clone(),
        None => prompt_for_input()?,
    };

    let (reader_config, export_config) = match &args.command {
        Command::Dump(dump) => (ReaderConfig::default(), dump.export_config()),
        Command::Csv(csv) => (
            ReaderConfig::default().with_required_format(FormatTag::Wod13),
            csv.export_config()?,
        ),
    };

    let mut processor = CastProcessor::open(&input, reader_config, export_config.clone())
        .with_context(|| format!("Failed to open {}", input.display()))?
        .with_progress(io_args.output.is_some() && !args.quiet);
    let out = open_output(io_args.output.as_deref())?;

    debug!("Reading casts from {}", input.display());
    let stats = match &args.command {
        Command::Dump(dump) => {
            let mut sink = DumpRenderer::new(out).with_backfill(!dump.no_backfill);
            run_session(&mut processor, &mut sink)?
        }
        Command::Csv(_) => {
            let mut sink = CsvRenderer::new(out, export_config);
            run_session(&mut processor, &mut sink)?
        }
    };
    Ok(stats)
}

fn run_session<R: io::BufRead, S: CastSink>(
    processor: &mut CastProcessor<R>,
    sink: &mut S,
) -> Result<ProcessingStats> {
    processor.run(sink).context("Processing failed")
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Print a colored run summary on stderr
pub fn print_summary(stats: &ProcessingStats, output: Option<&Path>) {
    eprintln!("\n{}", "Processing Summary".bright_green().bold());
    eprintln!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    eprintln!(
        "  {} {}",
        "Casts read:".bright_cyan(),
        stats.casts_read.to_string().bright_white().bold()
    );
    eprintln!(
        "  {} {}",
        "Casts written:".bright_cyan(),
        stats.casts_rendered.to_string().bright_white()
    );
    eprintln!(
        "  {} {}",
        "Levels decoded:".bright_cyan(),
        stats.levels_decoded.to_string().bright_white()
    );
    if let Some((first, last)) = stats.date_range {
        eprintln!(
            "  {} {} to {}",
            "Cast dates:".bright_cyan(),
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    if stats.growth_events > 0 {
        eprintln!(
            "  {} {}",
            "Buffer growths:".bright_cyan(),
            stats.growth_events.to_string().bright_white()
        );
    }
    if let Some(reason) = &stats.malformed_record {
        eprintln!(
            "  {} {}",
            "Stopped early:".bright_red(),
            reason.bright_red().bold()
        );
    }
    if let Some(path) = output {
        eprintln!("  {} {}", "Output:".bright_cyan(), path.display());
    }
}
