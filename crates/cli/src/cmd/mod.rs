mod generate;
mod plan;
mod stages;
mod state;

use std::path::{Path, PathBuf};

use clap::Args;

use nimbus_lib::consts::{CONFIG_FILENAME, DECLARATIONS_FILENAME, OUTPUT_DIR};

pub use generate::cmd_generate;
pub use plan::cmd_plan;
pub use stages::cmd_stages;
pub use state::cmd_state;

/// Where a project's config and declarations live.
#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
  /// Project directory containing nimbus.yml
  #[arg(short, long, default_value = ".")]
  pub project: PathBuf,

  /// Declarations file (default: <project>/nimbus-declarations.json)
  #[arg(short, long)]
  pub declarations: Option<PathBuf>,
}

impl ProjectArgs {
  pub fn config_path(&self) -> PathBuf {
    self.project.join(CONFIG_FILENAME)
  }

  pub fn declarations_path(&self) -> PathBuf {
    self
      .declarations
      .clone()
      .unwrap_or_else(|| self.project.join(DECLARATIONS_FILENAME))
  }
}

/// Build output directory, `<project>/.nimbus` unless overridden.
pub fn output_dir(project: &Path, out: Option<&Path>) -> PathBuf {
  out.map(PathBuf::from).unwrap_or_else(|| project.join(OUTPUT_DIR))
}
