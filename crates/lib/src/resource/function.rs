//! Function and IAM role resources.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::types::{CloudResource, ResourceKind, ResourceMeta};
use super::value::TemplateValue;
use crate::util::naming::{function_name, logical_id};

/// Sizing and placement of one synthesized function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionConfig {
  pub timeout: u32,
  pub memory: u32,
  pub stage: String,
  pub runtime: String,
}

/// Which runtime clients the generated handler needs wired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClientType {
  BasicFunction,
  NotificationTopic,
  Queue,
  KeyValueStore,
}

/// Coordinates of the developer method a function runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInformation {
  pub class_name: String,
  pub qualified_class_name: String,
  pub method_name: String,
}

impl MethodInformation {
  /// Name of the packaged handler artifact for this method.
  pub fn handler_file(&self) -> String {
    format!("{}.zip", logical_id(&[&self.class_name, &self.method_name, "Handler"]))
  }

  /// Template placeholder the deployer replaces with the uploaded artifact key.
  pub fn replacement_variable(&self) -> String {
    format!("${{{}}}", self.handler_file())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResource {
  meta: ResourceMeta,
  handler: String,
  method: MethodInformation,
  config: FunctionConfig,
  function_name: String,
  role: String,
  code_bucket: String,
  code_key: String,
  env: BTreeMap<String, TemplateValue>,
  clients: BTreeSet<ClientType>,
  extra_dependencies: BTreeSet<String>,
  invokable: bool,
}

impl FunctionResource {
  pub fn new(project_name: &str, handler: &str, method: MethodInformation, config: FunctionConfig) -> Self {
    let name = Self::logical_name(&method.class_name, &method.method_name, &config.stage);
    let function_name = function_name(project_name, &method.class_name, &method.method_name, &config.stage);
    let role = logical_id(&[&name, "IamRole"]);
    let mut meta = ResourceMeta::new(name, config.stage.clone());
    meta.add_depends_on(role.clone());
    Self {
      meta,
      handler: handler.to_string(),
      method,
      config,
      function_name,
      role,
      code_bucket: String::new(),
      code_key: String::new(),
      env: BTreeMap::new(),
      clients: BTreeSet::new(),
      extra_dependencies: BTreeSet::new(),
      invokable: false,
    }
  }

  pub fn logical_name(class_name: &str, method_name: &str, stage: &str) -> String {
    logical_id(&[class_name, method_name, "Function", stage])
  }

  pub fn handler(&self) -> &str {
    &self.handler
  }

  pub fn method(&self) -> &MethodInformation {
    &self.method
  }

  pub fn config(&self) -> &FunctionConfig {
    &self.config
  }

  pub fn timeout(&self) -> u32 {
    self.config.timeout
  }

  pub fn function_name(&self) -> &str {
    &self.function_name
  }

  /// Logical name of the role owned by this function.
  pub fn role_name(&self) -> &str {
    &self.role
  }

  pub fn set_code_location(&mut self, bucket: &str, key: &str) {
    self.code_bucket = bucket.to_string();
    self.code_key = key.to_string();
  }

  pub fn code_key(&self) -> &str {
    &self.code_key
  }

  /// Set an environment variable. A later write to the same key wins.
  pub fn add_env_variable(&mut self, key: &str, value: impl Into<TemplateValue>) {
    self.env.insert(key.to_string(), value.into());
  }

  pub fn env(&self) -> &BTreeMap<String, TemplateValue> {
    &self.env
  }

  pub fn env_variable(&self, key: &str) -> Option<&TemplateValue> {
    self.env.get(key)
  }

  pub fn add_client(&mut self, client: ClientType) {
    self.clients.insert(client);
  }

  pub fn clients(&self) -> &BTreeSet<ClientType> {
    &self.clients
  }

  pub fn add_extra_dependency(&mut self, qualified_name: &str) {
    self.extra_dependencies.insert(qualified_name.to_string());
  }

  pub fn extra_dependencies(&self) -> &BTreeSet<String> {
    &self.extra_dependencies
  }

  /// Mark this function as a target other functions may invoke directly.
  pub fn mark_invokable(&mut self) {
    self.invokable = true;
  }

  pub fn is_invokable(&self) -> bool {
    self.invokable
  }
}

impl CloudResource for FunctionResource {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::Function
  }

  fn base_properties(&self) -> Map<String, Value> {
    let variables: Map<String, Value> = self.env.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();

    let mut properties = Map::new();
    properties.insert(
      "Code".to_string(),
      json!({
        "S3Bucket": TemplateValue::reference(&self.code_bucket),
        "S3Key": self.code_key,
      }),
    );
    properties.insert("FunctionName".to_string(), json!(self.function_name));
    properties.insert("Handler".to_string(), json!(self.handler));
    properties.insert("MemorySize".to_string(), json!(self.config.memory));
    properties.insert("Timeout".to_string(), json!(self.config.timeout));
    properties.insert("Runtime".to_string(), json!(self.config.runtime));
    properties.insert("Role".to_string(), TemplateValue::get_att(&self.role, "Arn").to_json());
    properties.insert("Environment".to_string(), json!({ "Variables": variables }));
    properties
  }
}

/// One allow grant: (action pattern, target resource, ARN suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowStatement {
  pub action: String,
  pub target: String,
  pub suffix: String,
  pub arn: TemplateValue,
}

/// Execution role of a single function.
///
/// Statements are additive: nothing removes a grant once added, and identical
/// grants are kept side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct IamRoleResource {
  meta: ResourceMeta,
  function: String,
  statements: Vec<AllowStatement>,
}

impl IamRoleResource {
  pub fn new(function: &FunctionResource) -> Self {
    Self {
      meta: ResourceMeta::new(function.role_name(), function.stage()),
      function: function.name().to_string(),
      statements: Vec::new(),
    }
  }

  /// The function that owns this role.
  pub fn function(&self) -> &str {
    &self.function
  }

  pub fn add_allow_statement(&mut self, action: &str, target: &dyn CloudResource, suffix: &str) {
    self.add_allow_arn(action, target.name(), target.arn(suffix), suffix);
  }

  /// Grant against an explicit ARN expression, e.g. a stream ARN or a
  /// resource that lives outside this template.
  pub fn add_allow_arn(&mut self, action: &str, target: &str, arn: TemplateValue, suffix: &str) {
    self.statements.push(AllowStatement {
      action: action.to_string(),
      target: target.to_string(),
      suffix: suffix.to_string(),
      arn,
    });
  }

  pub fn statements(&self) -> &[AllowStatement] {
    &self.statements
  }

  pub fn has_action(&self, action: &str) -> bool {
    self.statements.iter().any(|s| s.action == action)
  }
}

impl CloudResource for IamRoleResource {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::IamRole
  }

  fn base_properties(&self) -> Map<String, Value> {
    let statements: Vec<Value> = self
      .statements
      .iter()
      .map(|s| {
        json!({
          "Effect": "Allow",
          "Action": s.action,
          "Resource": s.arn,
        })
      })
      .collect();

    let mut properties = Map::new();
    properties.insert(
      "AssumeRolePolicyDocument".to_string(),
      json!({
        "Version": "2012-10-17",
        "Statement": [{
          "Effect": "Allow",
          "Principal": { "Service": ["lambda.amazonaws.com"] },
          "Action": ["sts:AssumeRole"],
        }],
      }),
    );
    properties.insert(
      "Policies".to_string(),
      json!([{
        "PolicyName": "lambda",
        "PolicyDocument": { "Version": "2012-10-17", "Statement": statements },
      }]),
    );
    properties
  }
}
