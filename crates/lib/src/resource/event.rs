//! Resources that connect a function to the things that invoke it.

use serde_json::{Map, Value, json};

use super::function::FunctionResource;
use super::types::{CloudResource, ResourceKind, ResourceMeta};
use super::value::TemplateValue;
use crate::util::naming::logical_id;

#[derive(Debug, Clone, PartialEq)]
pub struct LogGroup {
  meta: ResourceMeta,
  log_group_name: String,
}

impl LogGroup {
  pub fn new(function: &FunctionResource) -> Self {
    let method = function.method();
    let name = logical_id(&[&method.class_name, &method.method_name, "LogGroup", function.stage()]);
    Self {
      meta: ResourceMeta::new(name, function.stage()),
      log_group_name: format!("/aws/lambda/{}", function.function_name()),
    }
  }

  pub fn log_group_name(&self) -> &str {
    &self.log_group_name
  }
}

impl CloudResource for LogGroup {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::LogGroup
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("LogGroupName".to_string(), json!(self.log_group_name));
    properties
  }
}

/// Grants a trigger's service principal the right to invoke a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPermission {
  meta: ResourceMeta,
  function: String,
  trigger: String,
  principal: String,
  source_arn: TemplateValue,
}

impl FunctionPermission {
  /// `name` must be chosen by the caller; see
  /// [`ResourceCollection::unique_name`](crate::resource::ResourceCollection::unique_name).
  pub fn new(name: String, function: &FunctionResource, trigger: &dyn CloudResource) -> Self {
    Self {
      meta: ResourceMeta::new(name, function.stage()),
      function: function.name().to_string(),
      trigger: trigger.name().to_string(),
      principal: trigger.kind().invoke_principal().to_string(),
      source_arn: trigger.arn(trigger.kind().source_arn_suffix()),
    }
  }

  /// Preferred logical name for the (function, trigger) pair.
  pub fn base_name(function: &FunctionResource, trigger: &dyn CloudResource) -> String {
    logical_id(&[function.name(), "PermissionFor", trigger.name()])
  }

  pub fn function(&self) -> &str {
    &self.function
  }

  pub fn trigger(&self) -> &str {
    &self.trigger
  }

  pub fn principal(&self) -> &str {
    &self.principal
  }
}

impl CloudResource for FunctionPermission {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::Permission
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("Action".to_string(), json!("lambda:InvokeFunction"));
    properties.insert(
      "FunctionName".to_string(),
      TemplateValue::get_att(&self.function, "Arn").to_json(),
    );
    properties.insert("Principal".to_string(), json!(self.principal));
    properties.insert("SourceArn".to_string(), self.source_arn.to_json());
    properties
  }
}

/// Polls a queue or stream and hands batches to a function.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMapping {
  meta: ResourceMeta,
  function: String,
  source: String,
  source_arn: TemplateValue,
  batch_size: u32,
  stream: bool,
}

impl EventMapping {
  pub fn new(
    name: String,
    source_arn: TemplateValue,
    source: &str,
    batch_size: u32,
    function: &FunctionResource,
    stream: bool,
  ) -> Self {
    let mut meta = ResourceMeta::new(name, function.stage());
    // The role must grant the poll permissions before the mapping is created.
    meta.add_depends_on(function.role_name());
    Self {
      meta,
      function: function.name().to_string(),
      source: source.to_string(),
      source_arn,
      batch_size,
      stream,
    }
  }

  pub fn base_name(function: &FunctionResource, source: &str) -> String {
    logical_id(&[function.name(), "EventMapping", source])
  }

  pub fn batch_size(&self) -> u32 {
    self.batch_size
  }

  pub fn is_stream(&self) -> bool {
    self.stream
  }

  pub fn function(&self) -> &str {
    &self.function
  }

  pub fn source(&self) -> &str {
    &self.source
  }
}

impl CloudResource for EventMapping {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::EventMapping
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("BatchSize".to_string(), json!(self.batch_size));
    properties.insert("Enabled".to_string(), json!(true));
    properties.insert("EventSourceArn".to_string(), self.source_arn.to_json());
    properties.insert("FunctionName".to_string(), TemplateValue::reference(&self.function).to_json());
    if self.stream {
      properties.insert("StartingPosition".to_string(), json!("TRIM_HORIZON"));
    }
    properties
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CronRule {
  meta: ResourceMeta,
  expression: String,
  function: String,
}

impl CronRule {
  pub fn new(expression: &str, function: &FunctionResource) -> Self {
    Self {
      meta: ResourceMeta::new(logical_id(&[function.name(), "CronRule"]), function.stage()),
      expression: expression.to_string(),
      function: function.name().to_string(),
    }
  }

  pub fn expression(&self) -> &str {
    &self.expression
  }
}

impl CloudResource for CronRule {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::CronRule
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("ScheduleExpression".to_string(), json!(format!("cron({})", self.expression)));
    properties.insert("State".to_string(), json!("ENABLED"));
    properties.insert(
      "Targets".to_string(),
      json!([{
        "Arn": TemplateValue::get_att(&self.function, "Arn"),
        "Id": logical_id(&[&self.function, "Target"]),
      }]),
    );
    properties
  }
}
