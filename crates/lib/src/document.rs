//! Stage documents: the create and update templates of every stage.
//!
//! The create template only bootstraps what the deployer needs before the
//! main update (the artifact bucket); the update template holds everything.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::resource::{OutputCollection, ResourceCollection};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageDocuments {
  pub update_resources: ResourceCollection,
  pub create_resources: ResourceCollection,
  pub update_outputs: OutputCollection,
  pub create_outputs: OutputCollection,
  /// Logical name of the stage's REST API once created.
  pub rest_api: Option<String>,
  pub api_gateway_deployment: Option<String>,
  pub websocket_api: Option<String>,
  pub websocket_deployment: Option<String>,
  /// Raw REST path (segments joined by `/`) to the key naming its resources.
  pub rest_paths: BTreeMap<String, String>,
}

impl StageDocuments {
  pub fn new() -> Self {
    Self::default()
  }

  /// Key naming the resources of REST path `raw`, derived from `readable`.
  ///
  /// A path seen before keeps its key. A new path whose readable key is
  /// already held by another path gets the first free numeric suffix, so
  /// distinct paths never share a node or method.
  pub fn rest_path_key(&mut self, raw: &str, readable: String) -> String {
    if let Some(key) = self.rest_paths.get(raw) {
      return key.clone();
    }
    let taken: BTreeSet<&str> = self.rest_paths.values().map(String::as_str).collect();
    let mut key = readable.clone();
    let mut suffix = 2;
    while taken.contains(key.as_str()) {
      key = format!("{}{}", readable, suffix);
      suffix += 1;
    }
    self.rest_paths.insert(raw.to_string(), key.clone());
    key
  }
}

/// Rendered create and update templates of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStage {
  pub stage: String,
  pub create: Value,
  pub update: Value,
}

impl RenderedStage {
  pub fn create_file_name(&self) -> String {
    format!("cloudformation-stack-create-{}.json", self.stage)
  }

  pub fn update_file_name(&self) -> String {
    format!("cloudformation-stack-update-{}.json", self.stage)
  }
}

/// Documents for every stage touched by a generation run, created lazily.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
  stages: BTreeMap<String, StageDocuments>,
}

impl DocumentSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get_or_create(&mut self, stage: &str) -> &mut StageDocuments {
    self.stages.entry(stage.to_string()).or_default()
  }

  pub fn get(&self, stage: &str) -> Option<&StageDocuments> {
    self.stages.get(stage)
  }

  pub fn get_mut(&mut self, stage: &str) -> Option<&mut StageDocuments> {
    self.stages.get_mut(stage)
  }

  pub fn stages(&self) -> impl Iterator<Item = &str> {
    self.stages.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &StageDocuments)> {
    self.stages.iter().map(|(stage, docs)| (stage.as_str(), docs))
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stages_are_created_lazily_once() {
    let mut docs = DocumentSet::new();
    assert!(docs.get("dev").is_none());
    docs.get_or_create("dev").rest_api = Some("NimbusRestApiDev".to_string());
    assert_eq!(docs.get_or_create("dev").rest_api.as_deref(), Some("NimbusRestApiDev"));
    assert_eq!(docs.len(), 1);
  }

  #[test]
  fn rest_path_keys_are_unique_per_path() {
    let mut docs = StageDocuments::new();
    assert_eq!(docs.rest_path_key("Items", "Items".to_string()), "Items");
    assert_eq!(docs.rest_path_key("items", "Items".to_string()), "Items2");
    assert_eq!(docs.rest_path_key("items2", "Items2".to_string()), "Items22");
    assert_eq!(docs.rest_path_key("items", "Items".to_string()), "Items2");
    assert_eq!(docs.rest_paths.len(), 3);
  }
}
