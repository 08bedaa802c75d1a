use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use texbake_core::prelude::*;
use texbake_core::TracingObserver;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "texbake",
    about = "Pack sprite folders into texture atlases under several configurations",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show a progress spinner (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline described by a settings file (YAML or JSON)
    Run(RunArgs),
    /// Pack a directory with configurations given on the command line
    Pack(PackArgs),
    /// Print a settings file after defaults are applied, then exit
    PrintConfig(PrintConfigArgs),
}

#[derive(Parser, Debug, Clone)]
struct RunArgs {
    /// Settings file path
    settings: PathBuf,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Configuration file (YAML/JSON, one object or a list); repeat for more variants
    #[arg(long, help_heading = "Input/Output")]
    config: Vec<PathBuf>,
    /// Discovery glob relative to the input directory (default: **/*.png); repeatable
    #[arg(long, help_heading = "Input/Output")]
    pattern: Vec<String>,
    /// Create the output directory if it is missing
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    create_out_dir: bool,
    /// Fail (non-zero exit) when any configuration or file write fails
    #[arg(long, default_value_t = false, help_heading = "Run")]
    strict: bool,
    /// Maximum configurations packed at once
    #[arg(long, help_heading = "Run")]
    max_concurrency: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
struct PrintConfigArgs {
    /// Settings file path
    settings: PathBuf,
    /// Output format: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Run(args) => {
            let settings = PipelineSettings::from_path(&args.settings)
                .with_context(|| format!("load settings {}", args.settings.display()))?;
            execute(settings.to_pipeline_run(), show_progress).await
        }
        Commands::Pack(args) => {
            let settings = settings_from_args(args)?;
            execute(settings.to_pipeline_run(), show_progress).await
        }
        Commands::PrintConfig(args) => {
            let settings = PipelineSettings::from_path(&args.settings)
                .with_context(|| format!("load settings {}", args.settings.display()))?;
            match args.format.as_str() {
                "yaml" => print!("{}", serde_yaml::to_string(&settings)?),
                _ => println!("{}", serde_json::to_string_pretty(&settings)?),
            }
            Ok(())
        }
    }
}

async fn execute(run: PipelineRun, show_progress: bool) -> anyhow::Result<()> {
    let run = if show_progress {
        run.with_observer(Arc::new(ProgressObserver::new()?))
    } else {
        run
    };
    let report = run.run().await.with_context(|| {
        format!(
            "pack {} -> {}",
            run.input_dir().display(),
            run.output_dir().display()
        )
    })?;
    info!(summary = %report.summary(), "done");
    Ok(())
}

fn settings_from_args(args: &PackArgs) -> anyhow::Result<PipelineSettings> {
    let mut configs = Vec::new();
    for path in &args.config {
        match load_configuration_set(path)? {
            ConfigurationSet::One(cfg) => configs.push(cfg),
            ConfigurationSet::Many(list) => configs.extend(list),
        }
    }
    let mut settings = PipelineSettings::new(&args.input, &args.out_dir);
    settings.options = ConfigurationSet::Many(configs);
    settings.strict = args.strict;
    settings.create_output_dir = args.create_out_dir;
    settings.max_concurrency = args.max_concurrency;
    settings.patterns = args.pattern.clone();
    Ok(settings)
}

fn load_configuration_set(path: &Path) -> anyhow::Result<ConfigurationSet> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    // YAML is a superset of JSON, so one parser covers both.
    let set: ConfigurationSet =
        serde_yaml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(set)
}

/// Drives a spinner from pipeline events and still logs failures.
struct ProgressObserver {
    bar: ProgressBar,
    log: TracingObserver,
}

impl ProgressObserver {
    fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {wide_msg}",
        )?);
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self {
            bar,
            log: TracingObserver,
        })
    }
}

impl PipelineObserver for ProgressObserver {
    fn on_event(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::AssetDiscovered { path, .. } => {
                self.bar.set_message(format!("found {path}"));
            }
            PipelineEvent::ConfigurationStarted { texture_name, .. } => {
                self.bar.set_message(format!("packing {texture_name}"));
            }
            PipelineEvent::FileWritten { path, .. } => {
                self.bar.set_message(format!("wrote {}", path.display()));
            }
            PipelineEvent::RunCompleted { .. } => self.bar.finish_and_clear(),
            _ => {}
        }
        self.bar.suspend(|| self.log.on_event(event));
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
