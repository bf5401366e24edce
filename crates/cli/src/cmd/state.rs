//! Implementation of the `nimbus state` command.
//!
//! Shows what the last generation recorded for packaging and deployment.

use std::path::Path;

use anyhow::{Context, Result};

use nimbus_lib::state::StateStore;

use super::output_dir;
use crate::output::{OutputFormat, print_info, print_item, print_json, print_stat, print_success, symbols};

pub fn cmd_state(project: &Path, out: Option<&Path>, verbose: bool, format: OutputFormat) -> Result<()> {
  let store = StateStore::new(output_dir(project, out));
  let Some(state) = store
    .load_if_exists()
    .with_context(|| format!("Failed to load build state: {}", store.state_path().display()))?
  else {
    print_info("No build state found. Run 'nimbus generate' to create one.");
    return Ok(());
  };

  if format.is_json() {
    return print_json(&state);
  }

  print_success(&format!("Build state of {}", state.project_name));
  print_stat("Generated", &state.compilation_timestamp);
  print_stat("Provider", &state.cloud_provider.to_string());
  print_stat("Handlers", &state.handler_files.len().to_string());
  let exports: usize = state.exports.values().map(Vec::len).sum();
  print_stat("Exports", &exports.to_string());
  let uploads: usize = state
    .file_uploads
    .values()
    .flat_map(|buckets| buckets.values())
    .map(Vec::len)
    .sum();
  print_stat("File uploads", &uploads.to_string());

  if verbose {
    if !state.handler_files.is_empty() {
      println!();
      println!("Handlers:");
      for handler in &state.handler_files {
        print_item(
          1,
          symbols::INFO,
          &format!("{} {} {}", handler.handler_class_path, symbols::ARROW, handler.handler_file),
        );
      }
    }

    for (stage, exports) in &state.exports {
      println!();
      println!("Exports ({}):", stage);
      for export in exports {
        print_item(1, symbols::INFO, &format!("{}: {}", export.export_message, export.export_name));
      }
    }

    for (stage, buckets) in &state.file_uploads {
      for (bucket, uploads) in buckets {
        println!();
        println!("Uploads to {} ({}):", bucket, stage);
        for upload in uploads {
          print_item(
            2,
            symbols::INFO,
            &format!("{} {} {}", upload.local_file, symbols::ARROW, upload.target_file),
          );
        }
      }
    }
  }

  Ok(())
}
