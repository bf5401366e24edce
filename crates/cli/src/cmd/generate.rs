//! Implementation of the `nimbus generate` command.
//!
//! Synthesizes every declaration, renders the create and update template of
//! each stage and writes them next to the build state.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use tracing::debug;

use nimbus_lib::config::ProjectConfig;
use nimbus_lib::declaration::Declarations;
use nimbus_lib::diagnostic::Diagnostics;
use nimbus_lib::document::RenderedStage;
use nimbus_lib::state::StateStore;
use nimbus_lib::synth::{BuildContext, GenerationSummary};
use nimbus_lib::template::{render_stage, template_hash};

use super::{ProjectArgs, output_dir};
use crate::output::{
  OutputFormat, format_bytes, format_duration, print_diagnostic, print_json, print_stat, print_success, truncate_hash,
};

/// Result of synthesizing a project in memory.
pub struct Generation {
  pub config: ProjectConfig,
  pub context: BuildContext,
  pub diagnostics: Diagnostics,
  pub summary: GenerationSummary,
  pub elapsed: Duration,
}

pub fn synthesize(args: &ProjectArgs) -> Result<Generation> {
  let config_path = args.config_path();
  let config = ProjectConfig::load(&config_path)
    .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

  let declarations_path = args.declarations_path();
  let declarations = Declarations::load(&declarations_path)
    .with_context(|| format!("Failed to load declarations: {}", declarations_path.display()))?;

  let timestamp = humantime::format_rfc3339_seconds(SystemTime::now()).to_string();
  let started = Instant::now();
  let mut context = BuildContext::new(&config, &timestamp);
  let mut diagnostics = Diagnostics::new();
  let summary = context.generate(&declarations, &mut diagnostics);

  Ok(Generation {
    config,
    context,
    diagnostics,
    summary,
    elapsed: started.elapsed(),
  })
}

/// Print every diagnostic and fail when any of them is an error.
pub fn report_diagnostics(diagnostics: &Diagnostics) -> Result<()> {
  for diagnostic in diagnostics.all() {
    print_diagnostic(diagnostic);
  }
  if diagnostics.has_errors() {
    bail!("Generation reported {} error(s)", diagnostics.error_count());
  }
  Ok(())
}

pub fn render_all(context: &BuildContext) -> Result<Vec<RenderedStage>> {
  context
    .documents
    .iter()
    .map(|(stage, documents)| {
      render_stage(stage, documents).with_context(|| format!("Failed to render stage {}", stage))
    })
    .collect()
}

fn write_template(path: &Path, template: &Value) -> Result<u64> {
  let content = serde_json::to_string_pretty(template).context("Failed to serialize template")?;
  fs::write(path, &content).with_context(|| format!("Failed to write template: {}", path.display()))?;
  Ok(content.len() as u64)
}

pub fn cmd_generate(args: &ProjectArgs, out: Option<&Path>, format: OutputFormat) -> Result<()> {
  let generation = synthesize(args)?;
  report_diagnostics(&generation.diagnostics)?;
  let rendered = render_all(&generation.context)?;

  let out_dir = output_dir(&args.project, out);
  fs::create_dir_all(&out_dir).with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;
  let out_dir = dunce::canonicalize(&out_dir).with_context(|| format!("Failed to resolve {}", out_dir.display()))?;

  let mut stages = Vec::new();
  for stage in &rendered {
    let create_bytes = write_template(&out_dir.join(stage.create_file_name()), &stage.create)?;
    let update_bytes = write_template(&out_dir.join(stage.update_file_name()), &stage.update)?;
    let hash = template_hash(&stage.update).context("Failed to hash update template")?;
    debug!(stage = %stage.stage, hash = %hash, create_bytes, update_bytes, "wrote stage templates");
    let resources = stage.update["Resources"].as_object().map(|r| r.len()).unwrap_or_default();
    stages.push(json!({
      "stage": stage.stage,
      "resources": resources,
      "hash": hash.0,
      "create_bytes": create_bytes,
      "update_bytes": update_bytes,
    }));
  }

  let store = StateStore::new(&out_dir);
  store
    .save(&generation.context.state)
    .with_context(|| format!("Failed to save build state: {}", store.state_path().display()))?;

  if format.is_json() {
    return print_json(&json!({
      "project": generation.config.project_name,
      "functions": generation.summary.functions,
      "output_dir": out_dir,
      "stages": stages,
    }));
  }

  print_success(&format!(
    "Generated {} function(s) for {} in {}",
    generation.summary.functions,
    generation.config.project_name,
    format_duration(generation.elapsed)
  ));
  for stage in &stages {
    print_stat(
      stage["stage"].as_str().unwrap_or_default(),
      &format!(
        "{} resources, {} {}",
        stage["resources"],
        truncate_hash(stage["hash"].as_str().unwrap_or_default()),
        format_bytes(stage["update_bytes"].as_u64().unwrap_or_default())
      ),
    );
  }
  print_stat("Output", &out_dir.display().to_string());
  Ok(())
}
