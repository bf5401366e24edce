//! Build state records.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::ClientType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudProvider {
  #[default]
  Aws,
}

impl std::fmt::Display for CloudProvider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CloudProvider::Aws => write!(f, "AWS"),
    }
  }
}

/// One generated handler entry point and what it needs at packaging time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerInformation {
  pub handler_class_path: String,
  pub handler_file: String,
  /// Placeholder in the update template replaced by the artifact key.
  pub replacement_variable: String,
  pub stages: BTreeSet<String>,
  #[serde(default)]
  pub uses_clients: BTreeSet<ClientType>,
  #[serde(default)]
  pub extra_dependencies: BTreeSet<String>,
}

/// A value the deployer substitutes once the stack is up, such as an API URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInformation {
  pub export_name: String,
  /// Shown to the user next to the resolved value after deployment.
  pub export_message: String,
  pub export_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadDescription {
  pub local_file: String,
  pub target_file: String,
  #[serde(default)]
  pub substitute_variables: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NimbusState {
  pub project_name: String,
  pub cloud_provider: CloudProvider,
  pub compilation_timestamp: String,
  pub handler_files: BTreeSet<HandlerInformation>,
  /// stage -> bucket -> files.
  pub file_uploads: BTreeMap<String, BTreeMap<String, Vec<FileUploadDescription>>>,
  /// stage -> exports.
  pub exports: BTreeMap<String, Vec<ExportInformation>>,
  pub assemble: bool,
}

impl NimbusState {
  pub fn new(project_name: &str, compilation_timestamp: &str) -> Self {
    Self {
      project_name: project_name.to_string(),
      compilation_timestamp: compilation_timestamp.to_string(),
      ..Default::default()
    }
  }

  pub fn add_handler(&mut self, handler: HandlerInformation) {
    self.handler_files.insert(handler);
  }

  pub fn add_export(&mut self, stage: &str, export: ExportInformation) {
    self.exports.entry(stage.to_string()).or_default().push(export);
  }

  pub fn add_file_upload(&mut self, stage: &str, bucket: &str, upload: FileUploadDescription) {
    self
      .file_uploads
      .entry(stage.to_string())
      .or_default()
      .entry(bucket.to_string())
      .or_default()
      .push(upload);
  }

  pub fn exports_for(&self, stage: &str) -> &[ExportInformation] {
    self.exports.get(stage).map(Vec::as_slice).unwrap_or_default()
  }
}

#[derive(Debug, Error)]
pub enum StateError {
  #[error("failed to create state directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to read state: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write state: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse state: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize state: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("no build state at {0}")]
  NotFound(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_fields_are_ignored() {
    let json = r#"{"project_name":"shop","cloud_provider":"AWS","future_field":42}"#;
    let state: NimbusState = serde_json::from_str(json).unwrap();
    assert_eq!(state.project_name, "shop");
    assert!(state.handler_files.is_empty());
  }

  #[test]
  fn exports_group_by_stage() {
    let mut state = NimbusState::new("shop", "2024-05-01T10:20:30Z");
    state.add_export(
      "dev",
      ExportInformation {
        export_name: "shop-dev-RestApiUrl".to_string(),
        export_message: "Created REST API. Base URL is ".to_string(),
        export_value: "${NIMBUS_REST_API_URL}".to_string(),
      },
    );
    assert_eq!(state.exports_for("dev").len(), 1);
    assert!(state.exports_for("prod").is_empty());
  }

  #[test]
  fn file_uploads_nest_stage_and_bucket() {
    let mut state = NimbusState::default();
    let upload = FileUploadDescription {
      local_file: "web/index.html".to_string(),
      target_file: "index.html".to_string(),
      substitute_variables: true,
    };
    state.add_file_upload("dev", "site", upload.clone());
    state.add_file_upload("dev", "site", upload);
    assert_eq!(state.file_uploads["dev"]["site"].len(), 2);
  }
}
