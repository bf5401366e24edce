//! Implementation of the `nimbus plan` command.
//!
//! Runs synthesis in memory and reports what each stage would contain,
//! including the order resources would be created in. Nothing is written.

use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::debug;

use nimbus_lib::document::StageDocuments;
use nimbus_lib::resource::ResourceKind;
use nimbus_lib::template::{DeploymentGraph, render_stage, template_hash};

use super::ProjectArgs;
use super::generate::{report_diagnostics, synthesize};
use crate::output::{OutputFormat, print_info, print_item, print_json, print_stat, print_success, symbols, truncate_hash};

fn kind_counts(documents: &StageDocuments) -> Vec<(ResourceKind, usize)> {
  ResourceKind::ALL
    .iter()
    .map(|kind| (*kind, documents.update_resources.count_of(*kind)))
    .filter(|(_, count)| *count > 0)
    .collect()
}

pub fn cmd_plan(args: &ProjectArgs, stage: Option<&str>, verbose: bool, format: OutputFormat) -> Result<()> {
  let generation = synthesize(args)?;
  report_diagnostics(&generation.diagnostics)?;

  if let Some(stage) = stage
    && generation.context.documents.get(stage).is_none()
  {
    bail!("Stage '{}' produced no resources", stage);
  }

  let mut plans = Vec::new();
  for (name, documents) in generation.context.documents.iter() {
    if stage.is_some_and(|s| s != name) {
      continue;
    }
    let rendered = render_stage(name, documents).with_context(|| format!("Failed to render stage {}", name))?;
    let hash = template_hash(&rendered.update).context("Failed to hash update template")?;
    let waves = DeploymentGraph::from_collection(&documents.update_resources)
      .and_then(|graph| graph.waves())
      .with_context(|| format!("Failed to order resources of stage {}", name))?;
    debug!(stage = %name, waves = waves.len(), "ordered stage resources");
    plans.push((name.to_string(), documents, hash, waves));
  }

  if format.is_json() {
    let stages: Vec<_> = plans
      .iter()
      .map(|(name, documents, hash, waves)| {
        let kinds: serde_json::Map<_, _> = kind_counts(documents)
          .into_iter()
          .map(|(kind, count)| (kind.to_string(), json!(count)))
          .collect();
        json!({
          "stage": name,
          "hash": hash.0,
          "resources": documents.update_resources.len(),
          "create_resources": documents.create_resources.len(),
          "outputs": documents.update_outputs.len(),
          "kinds": kinds,
          "waves": waves,
        })
      })
      .collect();
    return print_json(&json!({
      "project": generation.config.project_name,
      "functions": generation.summary.functions,
      "stages": stages,
    }));
  }

  print_success(&format!(
    "Plan for {}: {} function(s)",
    generation.config.project_name, generation.summary.functions
  ));
  for (name, documents, hash, waves) in &plans {
    println!();
    print_info(&format!("Stage {} ({})", name, truncate_hash(&hash.0)));
    print_stat("Resources", &documents.update_resources.len().to_string());
    print_stat("Create template", &documents.create_resources.len().to_string());
    print_stat("Outputs", &documents.update_outputs.len().to_string());
    for (kind, count) in kind_counts(documents) {
      print_stat(&format!("  {}", kind), &count.to_string());
    }

    if verbose {
      for (i, wave) in waves.iter().enumerate() {
        println!("  Wave {}:", i + 1);
        for resource in wave {
          print_item(2, symbols::ADD, resource);
        }
      }
    }
  }

  Ok(())
}
