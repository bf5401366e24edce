//! Implementation of the `nimbus stages` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use nimbus_lib::config::ProjectConfig;
use nimbus_lib::consts::CONFIG_FILENAME;

use crate::output::{OutputFormat, print_info, print_item, print_json, symbols};

pub fn cmd_stages(project: &Path, format: OutputFormat) -> Result<()> {
  let config_path = project.join(CONFIG_FILENAME);
  let config =
    ProjectConfig::load(&config_path).with_context(|| format!("Failed to load config: {}", config_path.display()))?;

  if format.is_json() {
    return print_json(&json!({
      "project": config.project_name,
      "stages": config.stages,
    }));
  }

  print_info(&format!("Stages of {}:", config.project_name));
  for stage in &config.stages {
    print_item(1, symbols::ARROW, stage);
  }
  Ok(())
}
