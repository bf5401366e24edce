//! Buckets and key-value tables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::function::FunctionResource;
use super::types::{CloudResource, ResourceKind, ResourceMeta};
use super::value::TemplateValue;
use crate::util::naming::{bucket_name, logical_id};

/// Holds the packaged function artifacts of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentBucket {
  meta: ResourceMeta,
  bucket_name: String,
}

impl DeploymentBucket {
  pub fn new(project_name: &str, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(Self::logical_name(stage), stage),
      bucket_name: bucket_name(&["nimbus", project_name, stage, "deployment"]),
    }
  }

  pub fn logical_name(stage: &str) -> String {
    logical_id(&["NimbusDeploymentBucket", stage])
  }

  pub fn bucket_name(&self) -> &str {
    &self.bucket_name
  }
}

impl CloudResource for DeploymentBucket {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::DeploymentBucket
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("BucketName".to_string(), json!(self.bucket_name));
    properties
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStorageEventType {
  ObjectCreated,
  ObjectDeleted,
}

impl FileStorageEventType {
  pub fn s3_event(self) -> &'static str {
    match self {
      FileStorageEventType::ObjectCreated => "s3:ObjectCreated:*",
      FileStorageEventType::ObjectDeleted => "s3:ObjectRemoved:*",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaConfiguration {
  pub event: FileStorageEventType,
  pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfiguration {
  pub index_document: String,
  pub error_document: String,
}

/// A user-declared bucket. Function triggers attach notification
/// configurations to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileBucket {
  meta: ResourceMeta,
  name: String,
  bucket_name: String,
  lambda_configurations: Vec<LambdaConfiguration>,
  website: Option<WebsiteConfiguration>,
}

impl FileBucket {
  pub fn new(name: &str, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(Self::logical_name(name, stage), stage),
      name: name.to_string(),
      bucket_name: bucket_name(&[name, stage]),
      lambda_configurations: Vec::new(),
      website: None,
    }
  }

  pub fn logical_name(name: &str, stage: &str) -> String {
    logical_id(&[name, "FileBucket", stage])
  }

  /// Name as declared, without the stage.
  pub fn declared_name(&self) -> &str {
    &self.name
  }

  pub fn bucket_name(&self) -> &str {
    &self.bucket_name
  }

  pub fn add_lambda_configuration(&mut self, event: FileStorageEventType, function: &FunctionResource) {
    self.lambda_configurations.push(LambdaConfiguration {
      event,
      function: function.name().to_string(),
    });
  }

  pub fn lambda_configurations(&self) -> &[LambdaConfiguration] {
    &self.lambda_configurations
  }

  pub fn set_website(&mut self, website: WebsiteConfiguration) {
    self.website = Some(website);
  }

  pub fn is_website(&self) -> bool {
    self.website.is_some()
  }

  pub fn website_url(&self) -> TemplateValue {
    self.attribute("WebsiteURL")
  }
}

impl CloudResource for FileBucket {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::FileBucket
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("BucketName".to_string(), json!(self.bucket_name));
    if !self.lambda_configurations.is_empty() {
      let configurations: Vec<Value> = self
        .lambda_configurations
        .iter()
        .map(|c| {
          json!({
            "Event": c.event.s3_event(),
            "Function": TemplateValue::get_att(&c.function, "Arn"),
          })
        })
        .collect();
      properties.insert(
        "NotificationConfiguration".to_string(),
        json!({ "LambdaConfigurations": configurations }),
      );
    }
    if let Some(website) = &self.website {
      properties.insert(
        "WebsiteConfiguration".to_string(),
        json!({
          "IndexDocument": website.index_document,
          "ErrorDocument": website.error_document,
        }),
      );
    }
    properties
  }

  // Built from the physical name; a GetAtt would make the bucket depend on
  // the permissions that in turn reference it.
  fn arn(&self, suffix: &str) -> TemplateValue {
    TemplateValue::literal(format!("arn:aws:s3:::{}", self.bucket_name)).with_suffix(suffix)
  }
}

/// Declared type of a table's hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
  #[default]
  String,
  Number,
  Binary,
}

impl KeyType {
  /// DynamoDB attribute type code.
  pub fn attribute_type(self) -> &'static str {
    match self {
      KeyType::String => "S",
      KeyType::Number => "N",
      KeyType::Binary => "B",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueTable {
  meta: ResourceMeta,
  table_name: String,
  key_name: String,
  key_type: KeyType,
  read_capacity: u32,
  write_capacity: u32,
}

impl KeyValueTable {
  pub fn new(
    table_name: &str,
    key_name: &str,
    key_type: KeyType,
    read_capacity: u32,
    write_capacity: u32,
    stage: &str,
  ) -> Self {
    Self {
      meta: ResourceMeta::new(Self::logical_name(table_name), stage),
      table_name: table_name.to_string(),
      key_name: key_name.to_string(),
      key_type,
      read_capacity,
      write_capacity,
    }
  }

  /// `table_name` already carries the stage.
  pub fn logical_name(table_name: &str) -> String {
    logical_id(&[table_name, "Table"])
  }

  pub fn table_name(&self) -> &str {
    &self.table_name
  }

  pub fn key_name(&self) -> &str {
    &self.key_name
  }

  pub fn key_type(&self) -> KeyType {
    self.key_type
  }

  pub fn stream_arn(&self) -> TemplateValue {
    self.attribute("StreamArn")
  }
}

impl CloudResource for KeyValueTable {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::KeyValueTable
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("TableName".to_string(), json!(self.table_name));
    properties.insert(
      "AttributeDefinitions".to_string(),
      json!([{
        "AttributeName": self.key_name,
        "AttributeType": self.key_type.attribute_type(),
      }]),
    );
    properties.insert(
      "KeySchema".to_string(),
      json!([{ "AttributeName": self.key_name, "KeyType": "HASH" }]),
    );
    properties.insert(
      "ProvisionedThroughput".to_string(),
      json!({
        "ReadCapacityUnits": self.read_capacity,
        "WriteCapacityUnits": self.write_capacity,
      }),
    );
    properties
  }
}
