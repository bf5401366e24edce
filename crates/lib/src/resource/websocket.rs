//! WebSocket API resources.

use serde_json::{Map, Value, json};

use super::function::FunctionResource;
use super::http::{execute_api_arn, lambda_integration_uri};
use super::types::{CloudResource, ResourceKind, ResourceMeta};
use super::value::TemplateValue;
use crate::util::naming::{logical_id, timestamp_suffix};

#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketApi {
  meta: ResourceMeta,
  api_name: String,
}

impl WebSocketApi {
  pub fn new(project_name: &str, stage: &str) -> Self {
    Self {
      meta: ResourceMeta::new(logical_id(&["NimbusWebSocketApi", stage]), stage),
      api_name: format!("{}-{}-WebSocket", project_name, stage),
    }
  }

  pub fn url(&self) -> TemplateValue {
    TemplateValue::Join(vec![
      TemplateValue::literal("wss://"),
      self.reference(),
      TemplateValue::literal(".execute-api."),
      TemplateValue::region(),
      TemplateValue::literal(format!(".amazonaws.com/{}", self.stage())),
    ])
  }
}

impl CloudResource for WebSocketApi {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::WebSocketApi
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("Name".to_string(), json!(self.api_name));
    properties.insert("ProtocolType".to_string(), json!("WEBSOCKET"));
    properties.insert("RouteSelectionExpression".to_string(), json!("$request.body.action"));
    properties
  }

  fn arn(&self, suffix: &str) -> TemplateValue {
    execute_api_arn(self.reference()).with_suffix(suffix)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketDeployment {
  meta: ResourceMeta,
  api: String,
}

impl WebSocketDeployment {
  pub fn new(api: &WebSocketApi, timestamp: &str) -> Self {
    let stamp = timestamp_suffix(timestamp);
    Self {
      meta: ResourceMeta::new(
        logical_id(&["NimbusWebSocketDeployment", api.stage(), &stamp]),
        api.stage(),
      ),
      api: api.name().to_string(),
    }
  }
}

impl CloudResource for WebSocketDeployment {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::WebSocketDeployment
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("ApiId".to_string(), TemplateValue::reference(&self.api).to_json());
    properties
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketStage {
  meta: ResourceMeta,
  api: String,
  deployment: String,
}

impl WebSocketStage {
  pub fn new(api: &WebSocketApi, deployment: &WebSocketDeployment) -> Self {
    Self {
      meta: ResourceMeta::new(logical_id(&["NimbusWebSocketStage", api.stage()]), api.stage()),
      api: api.name().to_string(),
      deployment: deployment.name().to_string(),
    }
  }
}

impl CloudResource for WebSocketStage {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::WebSocketStage
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("ApiId".to_string(), TemplateValue::reference(&self.api).to_json());
    properties.insert(
      "DeploymentId".to_string(),
      TemplateValue::reference(&self.deployment).to_json(),
    );
    properties.insert("StageName".to_string(), json!(self.stage()));
    properties
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketIntegration {
  meta: ResourceMeta,
  api: String,
  function: String,
  route_key: String,
}

impl WebSocketIntegration {
  pub fn new(api: &WebSocketApi, function: &FunctionResource, route_key: &str) -> Self {
    Self {
      meta: ResourceMeta::new(
        logical_id(&["WebSocketIntegration", route_key, function.stage()]),
        function.stage(),
      ),
      api: api.name().to_string(),
      function: function.name().to_string(),
      route_key: route_key.to_string(),
    }
  }

  pub fn function(&self) -> &str {
    &self.function
  }

  pub fn route_key(&self) -> &str {
    &self.route_key
  }
}

impl CloudResource for WebSocketIntegration {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::WebSocketIntegration
  }

  fn base_properties(&self) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("ApiId".to_string(), TemplateValue::reference(&self.api).to_json());
    properties.insert("IntegrationType".to_string(), json!("AWS_PROXY"));
    properties.insert(
      "IntegrationUri".to_string(),
      lambda_integration_uri(&self.function).to_json(),
    );
    properties
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketRoute {
  meta: ResourceMeta,
  api: String,
  integration: String,
  route_key: String,
}

impl WebSocketRoute {
  pub fn new(api: &WebSocketApi, integration: &WebSocketIntegration, route_key: &str) -> Self {
    Self {
      meta: ResourceMeta::new(
        logical_id(&["WebSocketRoute", route_key, integration.stage()]),
        integration.stage(),
      ),
      api: api.name().to_string(),
      integration: integration.name().to_string(),
      route_key: route_key.to_string(),
    }
  }

  pub fn route_key(&self) -> &str {
    &self.route_key
  }
}

impl CloudResource for WebSocketRoute {
  fn meta(&self) -> &ResourceMeta {
    &self.meta
  }

  fn meta_mut(&mut self) -> &mut ResourceMeta {
    &mut self.meta
  }

  fn kind(&self) -> ResourceKind {
    ResourceKind::WebSocketRoute
  }

  fn base_properties(&self) -> Map<String, Value> {
    let target = TemplateValue::Join(vec![
      TemplateValue::literal("integrations/"),
      TemplateValue::reference(&self.integration),
    ]);
    let mut properties = Map::new();
    properties.insert("ApiId".to_string(), TemplateValue::reference(&self.api).to_json());
    properties.insert("RouteKey".to_string(), json!(self.route_key));
    properties.insert("AuthorizationType".to_string(), json!("NONE"));
    properties.insert("Target".to_string(), target.to_json());
    properties
  }
}
