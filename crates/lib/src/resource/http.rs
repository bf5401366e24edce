//! REST API resources.
//!
//! One [`RestApi`] and one [`ApiGatewayDeployment`] exist per stage. Path
//! segments become a tree of [`RestApiResource`] nodes hanging off the API
//! root, and every (path, verb) pair gets a [`RestMethod`] at its leaf.

use serde_json::{Map, Value, json};

use super::function::FunctionResource;
use super::types::{CloudResource, ResourceKind, ResourceMeta};
use super::value::TemplateValue;
use crate::util::naming::{logical_id, timestamp_suffix};

#[derive(Debug, Clone, PartialEq)]
pub struct RestApi {
  meta: ResourceMeta,
  api_name: String,
}

impl RestApi {
  pub fn new(project_name: &str, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(logical_id(&["NimbusRestApi", stage]), stage),
      api_name: format!("{}-{}-HTTP", project_name, stage),
    }
  }

  /// Public base URL of the deployed stage.
  pub fn url(&self) -> TemplateValue {
    TemplateValue::Join(vec![
      TemplateValue::literal("https://"),
      self.reference(),
      TemplateValue::literal(".execute-api."),
      TemplateValue::region(),
      TemplateValue::literal(format!(".amazonaws.com/{}", self.stage())),
    ])
  }
}

impl CloudResource for RestApi {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::RestApi
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("Name".to_string(), json!(self.api_name));
    properties
  }

  fn arn(&self, suffix: &str) -> TemplateValue {
    execute_api_arn(self.reference()).with_suffix(suffix)
  }
}

pub(crate) fn execute_api_arn(api: TemplateValue) -> TemplateValue {
  TemplateValue::Join(vec![
    TemplateValue::literal("arn:aws:execute-api:"),
    TemplateValue::region(),
    TemplateValue::literal(":"),
    TemplateValue::account_id(),
    TemplateValue::literal(":"),
    api,
  ])
}

pub(crate) fn lambda_integration_uri(function: &str) -> TemplateValue {
  TemplateValue::Join(vec![
    TemplateValue::literal("arn:aws:apigateway:"),
    TemplateValue::region(),
    TemplateValue::literal(":lambda:path/2015-03-31/functions/"),
    TemplateValue::get_att(function, "Arn"),
    TemplateValue::literal("/invocations"),
  ])
}

/// Where a path node or method is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestParent {
  Root { api: String },
  Resource { api: String, resource: String },
}

impl RestParent {
  pub fn api(&self) -> &str {
    match self {
      RestParent::Root { api } | RestParent::Resource { api, .. } => api,
    }
  }

  fn id(&self) -> TemplateValue {
    match self {
      RestParent::Root { api } => TemplateValue::get_att(api, "RootResourceId"),
      RestParent::Resource { resource, .. } => TemplateValue::reference(resource),
    }
  }
}

/// One path segment node.
#[derive(Debug, Clone, PartialEq)]
pub struct RestApiResource {
  meta: ResourceMeta,
  parent: RestParent,
  path_part: String,
}

impl RestApiResource {
  /// `path_key` identifies the full path up to and including `path_part`
  /// within the stage; nodes for the same prefix share a single entry.
  pub fn new(parent: RestParent, path_key: &str, path_part: &str, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(Self::logical_name(path_key, stage), stage),
      parent,
      path_part: path_part.to_string(),
    }
  }

  pub fn logical_name(path_key: &str, stage: &str) -> String {
    logical_id(&["ApiGatewayResource", path_key, stage])
  }

  pub fn path_part(&self) -> &str {
    &self.path_part
  }

  pub fn parent(&self) -> &RestParent {
    &self.parent
  }
}

impl CloudResource for RestApiResource {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::RestResource
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("ParentId".to_string(), self.parent.id().to_json());
    properties.insert("PathPart".to_string(), json!(self.path_part));
    properties.insert(
      "RestApiId".to_string(),
      TemplateValue::reference(self.parent.api()).to_json(),
    );
    properties
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestMethod {
  meta: ResourceMeta,
  resource: RestParent,
  http_method: String,
  function: String,
}

impl RestMethod {
  pub fn new(resource: RestParent, path_key: &str, http_method: &str, function: &FunctionResource) -> Self {
    let http_method = http_method.to_uppercase();
    let name = logical_id(&["ApiGatewayMethod", path_key, &http_method, function.stage()]);

    let mut meta = ResourceMeta::new(name, function.stage());
    meta.add_depends_on(function.name());
    Self {
      meta,
      resource,
      http_method,
      function: function.name().to_string(),
    }
  }

  pub fn http_method(&self) -> &str {
    &self.http_method
  }

  pub fn function(&self) -> &str {
    &self.function
  }

  pub fn resource(&self) -> &RestParent {
    &self.resource
  }
}

impl CloudResource for RestMethod {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::RestMethod
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("AuthorizationType".to_string(), json!("NONE"));
    properties.insert("HttpMethod".to_string(), json!(self.http_method));
    properties.insert("ResourceId".to_string(), self.resource.id().to_json());
    properties.insert(
      "RestApiId".to_string(),
      TemplateValue::reference(self.resource.api()).to_json(),
    );
    properties.insert(
      "Integration".to_string(),
      json!({
        "Type": "AWS_PROXY",
        "IntegrationHttpMethod": "POST",
        "Uri": lambda_integration_uri(&self.function),
      }),
    );
    properties
  }
}

/// Deployment of the stage's REST API. Its name carries the build timestamp
/// so every generation run produces a fresh deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiGatewayDeployment {
  meta: ResourceMeta,
  api: String,
}

impl ApiGatewayDeployment {
  pub fn new(api: &RestApi, timestamp: &str) -> Self {
    let stamp = timestamp_suffix(timestamp);
    Self {
      meta: ResourceMeta::new(
        logical_id(&["NimbusApiGatewayDeployment", api.stage(), &stamp]),
        api.stage(),
      ),
      api: api.name().to_string(),
    }
  }
}

impl CloudResource for ApiGatewayDeployment {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::ApiGatewayDeployment
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("RestApiId".to_string(), TemplateValue::reference(&self.api).to_json());
    properties.insert("StageName".to_string(), json!(self.stage()));
    properties
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::naming::path_key;

  #[test]
  fn nested_resources_share_prefix_names() {
    let a_from_b = RestApiResource::logical_name(&path_key(&["a"]), "dev");
    let a_from_c = RestApiResource::logical_name(&path_key(&["a"]), "dev");
    let ab = RestApiResource::logical_name(&path_key(&["a", "b"]), "dev");
    assert_eq!(a_from_b, a_from_c);
    assert_ne!(a_from_b, ab);
  }

  #[test]
  fn root_parent_uses_root_resource_id() {
    let parent = RestParent::Root {
      api: "NimbusRestApiDev".to_string(),
    };
    let node = RestApiResource::new(parent, "Items", "items", "dev");
    assert_eq!(node.name(), "ApiGatewayResourceItemsDev");
    assert_eq!(
      node.properties()["ParentId"],
      json!({ "Fn::GetAtt": ["NimbusRestApiDev", "RootResourceId"] })
    );
    assert_eq!(node.path_part(), "items");
  }

  #[test]
  fn rest_api_arn_is_execute_api() {
    let api = RestApi::new("shop", "dev");
    let arn = api.arn("/*").to_json();
    assert_eq!(arn["Fn::Join"][1][0], "arn:aws:execute-api:");
    assert_eq!(arn["Fn::Join"][1][6], "/*");
  }

  #[test]
  fn deployment_name_carries_timestamp() {
    let api = RestApi::new("shop", "dev");
    let deployment = ApiGatewayDeployment::new(&api, "2024-05-01T10:20:30Z");
    assert_eq!(deployment.name(), "NimbusApiGatewayDeploymentDev20240501102030");
  }
}
