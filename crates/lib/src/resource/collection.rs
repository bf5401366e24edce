//! Per-stage resource and output containers.

use std::collections::HashMap;

use serde::Serialize;

use super::function::{FunctionResource, IamRoleResource};
use super::messaging::SnsTopic;
use super::types::{CloudResource, Resource, ResourceKind};
use super::value::TemplateValue;

/// Resources of one template, keyed by logical name.
///
/// Iteration follows insertion order. Adding a resource under a name that is
/// already taken replaces the stored value in its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCollection {
  resources: Vec<Resource>,
  index: HashMap<String, usize>,
}

impl ResourceCollection {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or replace. Returns the previous resource stored under the name.
  pub fn add_resource(&mut self, resource: impl Into<Resource>) -> Option<Resource> {
    let resource = resource.into();
    match self.index.get(resource.name()) {
      Some(&position) => Some(std::mem::replace(&mut self.resources[position], resource)),
      None => {
        self.index.insert(resource.name().to_string(), self.resources.len());
        self.resources.push(resource);
        None
      }
    }
  }

  pub fn get(&self, name: &str) -> Option<&Resource> {
    self.index.get(name).map(|&position| &self.resources[position])
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut Resource> {
    match self.index.get(name) {
      Some(&position) => Some(&mut self.resources[position]),
      None => None,
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.resources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.resources.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Resource> {
    self.resources.iter()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.resources.iter().map(|r| r.name())
  }

  pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
    self.resources.iter().filter(move |r| r.kind() == kind)
  }

  pub fn count_of(&self, kind: ResourceKind) -> usize {
    self.of_kind(kind).count()
  }

  pub fn function(&self, name: &str) -> Option<&FunctionResource> {
    self.get(name).and_then(Resource::as_function)
  }

  pub fn function_mut(&mut self, name: &str) -> Option<&mut FunctionResource> {
    self.get_mut(name).and_then(Resource::as_function_mut)
  }

  pub fn role_mut(&mut self, name: &str) -> Option<&mut IamRoleResource> {
    self.get_mut(name).and_then(Resource::as_role_mut)
  }

  /// A function registered without a trigger for direct invocation, found by
  /// its simple class name and method.
  pub fn invokable_function(&self, class_name: &str, method_name: &str) -> Option<&FunctionResource> {
    self
      .resources
      .iter()
      .filter_map(Resource::as_function)
      .find(|f| f.is_invokable() && f.method().class_name == class_name && f.method().method_name == method_name)
  }

  /// First topic declared under `topic`, subscribed or not.
  pub fn topic_by_name(&self, topic: &str) -> Option<&SnsTopic> {
    self.resources.iter().filter_map(Resource::as_topic).find(|t| t.topic() == topic)
  }

  /// `base` if free, else `base` followed by the first free numeric suffix.
  pub fn unique_name(&self, base: &str) -> String {
    if !self.contains(base) {
      return base.to_string();
    }
    (2..)
      .map(|n| format!("{}{}", base, n))
      .find(|candidate| !self.contains(candidate))
      .unwrap_or_else(|| base.to_string())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateOutput {
  pub name: String,
  pub value: TemplateValue,
  pub export_name: Option<String>,
}

/// Template outputs, keyed by name with the same replace-in-place rule as
/// [`ResourceCollection`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputCollection {
  outputs: Vec<TemplateOutput>,
}

impl OutputCollection {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_output(&mut self, name: &str, value: TemplateValue, export_name: Option<String>) {
    let output = TemplateOutput {
      name: name.to_string(),
      value,
      export_name,
    };
    match self.outputs.iter_mut().find(|o| o.name == name) {
      Some(existing) => *existing = output,
      None => self.outputs.push(output),
    }
  }

  pub fn get(&self, name: &str) -> Option<&TemplateOutput> {
    self.outputs.iter().find(|o| o.name == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &TemplateOutput> {
    self.outputs.iter()
  }

  pub fn len(&self) -> usize {
    self.outputs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outputs.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resource::messaging::QueueResource;
  use crate::resource::storage::DeploymentBucket;

  #[test]
  fn same_key_replaces_in_place() {
    let mut collection = ResourceCollection::new();
    collection.add_resource(QueueResource::new("a", 60, "dev"));
    collection.add_resource(DeploymentBucket::new("shop", "dev"));
    let previous = collection.add_resource(QueueResource::new("a", 120, "dev"));

    assert!(previous.is_some());
    assert_eq!(collection.len(), 2);
    let first = collection.iter().next().and_then(Resource::as_queue);
    assert_eq!(first.map(QueueResource::visibility_timeout), Some(120));
  }

  #[test]
  fn distinct_keys_coexist() {
    let mut collection = ResourceCollection::new();
    collection.add_resource(QueueResource::new("a", 60, "dev"));
    collection.add_resource(QueueResource::new("b", 60, "dev"));
    assert_eq!(collection.count_of(ResourceKind::Queue), 2);
  }

  #[test]
  fn unique_name_appends_suffix() {
    let mut collection = ResourceCollection::new();
    assert_eq!(collection.unique_name("SQSQueueADev"), "SQSQueueADev");
    collection.add_resource(QueueResource::new("a", 60, "dev"));
    assert_eq!(collection.unique_name("SQSQueueADev"), "SQSQueueADev2");
  }

  #[test]
  fn outputs_replace_by_name() {
    let mut outputs = OutputCollection::new();
    outputs.add_output("Url", TemplateValue::literal("a"), None);
    outputs.add_output("Url", TemplateValue::literal("b"), Some("export".to_string()));
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs.get("Url").map(|o| &o.value), Some(&TemplateValue::literal("b")));
  }
}
