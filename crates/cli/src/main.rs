mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{ProjectArgs, cmd_generate, cmd_plan, cmd_stages, cmd_state};
use crate::output::OutputFormat;

/// Nimbus - serverless resource graph synthesis
#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Synthesize templates and build state for every stage
  Generate {
    #[command(flatten)]
    project: ProjectArgs,

    /// Directory to write templates and state to (default: <project>/.nimbus)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },

  /// Show what generation would produce without writing anything
  Plan {
    #[command(flatten)]
    project: ProjectArgs,

    /// Only show this stage
    #[arg(short, long)]
    stage: Option<String>,
  },

  /// List the stages the project deploys to
  Stages {
    /// Project directory containing nimbus.yml
    #[arg(short, long, default_value = ".")]
    project: PathBuf,
  },

  /// Show the build state written by the last generation
  State {
    /// Project directory containing nimbus.yml
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Directory the state was written to (default: <project>/.nimbus)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
}

fn init_tracing(verbose: u8) {
  let default_level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let verbose = cli.verbose > 0;
  match cli.command {
    Commands::Generate { project, out } => cmd_generate(&project, out.as_deref(), cli.format),
    Commands::Plan { project, stage } => cmd_plan(&project, stage.as_deref(), verbose, cli.format),
    Commands::Stages { project } => cmd_stages(&project, cli.format),
    Commands::State { project, out } => cmd_state(&project, out.as_deref(), verbose, cli.format),
  }
}
