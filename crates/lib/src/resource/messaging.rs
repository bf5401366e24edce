//! Queue and topic resources.

use serde_json::{Map, Value, json};

use super::function::FunctionResource;
use super::types::{CloudResource, ResourceKind, ResourceMeta};
use super::value::TemplateValue;
use crate::util::naming::logical_id;

#[derive(Debug, Clone, PartialEq)]
pub struct QueueResource {
  meta: ResourceMeta,
  id: String,
  visibility_timeout: u32,
}

impl QueueResource {
  pub fn new(id: &str, visibility_timeout: u32, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(Self::logical_name(id, stage), stage),
      id: id.to_string(),
      visibility_timeout,
    }
  }

  pub fn logical_name(id: &str, stage: &str) -> String {
    logical_id(&["SQSQueue", id, stage])
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn visibility_timeout(&self) -> u32 {
    self.visibility_timeout
  }

  /// Queue URL; `Ref` on a queue resolves to it.
  pub fn url(&self) -> TemplateValue {
    self.reference()
  }
}

impl CloudResource for QueueResource {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::Queue
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("VisibilityTimeout".to_string(), json!(self.visibility_timeout));
    properties
  }
}

/// A notification topic, optionally with a function subscribed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnsTopic {
  meta: ResourceMeta,
  topic: String,
  topic_name: String,
  subscriber: Option<String>,
}

impl SnsTopic {
  /// Topic owned by a subscribing function. The logical name is scoped to the
  /// function while the physical name is shared by every subscriber of the
  /// same topic in the stage.
  pub fn for_function(topic: &str, function: &FunctionResource) -> Self {
    Self {
      meta: ResourceMeta::new(logical_id(&["SNSTopic", topic, function.name()]), function.stage()),
      topic: topic.to_string(),
      topic_name: format!("{}{}", topic, function.stage()),
      subscriber: Some(function.name().to_string()),
    }
  }

  /// Topic without a subscriber, created for a publisher when no subscriber
  /// declared it.
  pub fn standalone(topic: &str, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(logical_id(&["SNSTopic", topic, stage]), stage),
      topic: topic.to_string(),
      topic_name: format!("{}{}", topic, stage),
      subscriber: None,
    }
  }

  /// Topic as declared, without the stage.
  pub fn topic(&self) -> &str {
    &self.topic
  }

  /// Physical topic name.
  pub fn topic_name(&self) -> &str {
    &self.topic_name
  }

  pub fn subscriber(&self) -> Option<&str> {
    self.subscriber.as_deref()
  }
}

impl CloudResource for SnsTopic {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::Topic
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("TopicName".to_string(), json!(self.topic_name));
    if let Some(subscriber) = &self.subscriber {
      properties.insert(
        "Subscription".to_string(),
        json!([{
          "Endpoint": TemplateValue::get_att(subscriber, "Arn"),
          "Protocol": "lambda",
        }]),
      );
    }
    properties
  }

  // `Ref` on a topic yields its ARN.
  fn arn(&self, suffix: &str) -> TemplateValue {
    self.reference().with_suffix(suffix)
  }
}
