//! Shared resource capabilities.
//!
//! Every deployable unit is one variant of the closed [`Resource`] enum. The
//! variants share identity, stage, dependency edges and an extra-property bag
//! through [`ResourceMeta`], and expose their kind-specific template
//! properties and attributes through the [`CloudResource`] trait.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::{CronRule, EventMapping, FunctionPermission, LogGroup};
use super::function::{FunctionResource, IamRoleResource};
use super::http::{ApiGatewayDeployment, RestApi, RestApiResource, RestMethod};
use super::messaging::{QueueResource, SnsTopic};
use super::storage::{DeploymentBucket, FileBucket, KeyValueTable};
use super::value::TemplateValue;
use super::websocket::{WebSocketApi, WebSocketDeployment, WebSocketIntegration, WebSocketRoute, WebSocketStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
  Function,
  IamRole,
  LogGroup,
  DeploymentBucket,
  FileBucket,
  Queue,
  Topic,
  RestApi,
  RestResource,
  RestMethod,
  ApiGatewayDeployment,
  WebSocketApi,
  WebSocketDeployment,
  WebSocketStage,
  WebSocketRoute,
  WebSocketIntegration,
  EventMapping,
  Permission,
  CronRule,
  KeyValueTable,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 20] = [
    ResourceKind::Function,
    ResourceKind::IamRole,
    ResourceKind::LogGroup,
    ResourceKind::DeploymentBucket,
    ResourceKind::FileBucket,
    ResourceKind::Queue,
    ResourceKind::Topic,
    ResourceKind::RestApi,
    ResourceKind::RestResource,
    ResourceKind::RestMethod,
    ResourceKind::ApiGatewayDeployment,
    ResourceKind::WebSocketApi,
    ResourceKind::WebSocketDeployment,
    ResourceKind::WebSocketStage,
    ResourceKind::WebSocketRoute,
    ResourceKind::WebSocketIntegration,
    ResourceKind::EventMapping,
    ResourceKind::Permission,
    ResourceKind::CronRule,
    ResourceKind::KeyValueTable,
  ];

  /// The CloudFormation type this kind renders to.
  pub fn cfn_type(self) -> &'static str {
    match self {
      ResourceKind::Function => "AWS::Lambda::Function",
      ResourceKind::IamRole => "AWS::IAM::Role",
      ResourceKind::LogGroup => "AWS::Logs::LogGroup",
      ResourceKind::DeploymentBucket | ResourceKind::FileBucket => "AWS::S3::Bucket",
      ResourceKind::Queue => "AWS::SQS::Queue",
      ResourceKind::Topic => "AWS::SNS::Topic",
      ResourceKind::RestApi => "AWS::ApiGateway::RestApi",
      ResourceKind::RestResource => "AWS::ApiGateway::Resource",
      ResourceKind::RestMethod => "AWS::ApiGateway::Method",
      ResourceKind::ApiGatewayDeployment => "AWS::ApiGateway::Deployment",
      ResourceKind::WebSocketApi => "AWS::ApiGatewayV2::Api",
      ResourceKind::WebSocketDeployment => "AWS::ApiGatewayV2::Deployment",
      ResourceKind::WebSocketStage => "AWS::ApiGatewayV2::Stage",
      ResourceKind::WebSocketRoute => "AWS::ApiGatewayV2::Route",
      ResourceKind::WebSocketIntegration => "AWS::ApiGatewayV2::Integration",
      ResourceKind::EventMapping => "AWS::Lambda::EventSourceMapping",
      ResourceKind::Permission => "AWS::Lambda::Permission",
      ResourceKind::CronRule => "AWS::Events::Rule",
      ResourceKind::KeyValueTable => "AWS::DynamoDB::Table",
    }
  }

  /// Service principal that invokes a function when this kind is a trigger.
  pub fn invoke_principal(self) -> &'static str {
    match self {
      ResourceKind::RestApi | ResourceKind::WebSocketApi => "apigateway.amazonaws.com",
      ResourceKind::Topic => "sns.amazonaws.com",
      ResourceKind::CronRule => "events.amazonaws.com",
      ResourceKind::FileBucket | ResourceKind::DeploymentBucket => "s3.amazonaws.com",
      _ => "lambda.amazonaws.com",
    }
  }

  /// Suffix appended to a trigger's ARN in a permission's `SourceArn`.
  /// APIs are invoked through `{api}/{stage}/{verb}/{path}` ARNs.
  pub fn source_arn_suffix(self) -> &'static str {
    match self {
      ResourceKind::RestApi | ResourceKind::WebSocketApi => "/*",
      _ => "",
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Identity and graph edges common to every resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMeta {
  name: String,
  stage: String,
  depends_on: Vec<String>,
  extra_properties: BTreeMap<String, Value>,
}

impl ResourceMeta {
  pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      stage: stage.into(),
      depends_on: Vec::new(),
      extra_properties: BTreeMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn stage(&self) -> &str {
    &self.stage
  }

  pub fn depends_on(&self) -> &[String] {
    &self.depends_on
  }

  /// Record a deployment-ordering edge. Repeated edges are kept once.
  pub fn add_depends_on(&mut self, name: impl Into<String>) {
    let name = name.into();
    if name != self.name && !self.depends_on.contains(&name) {
      self.depends_on.push(name);
    }
  }

  pub fn extra_properties(&self) -> &BTreeMap<String, Value> {
    &self.extra_properties
  }

  pub fn add_extra_property(&mut self, key: impl Into<String>, value: Value) {
    self.extra_properties.insert(key.into(), value);
  }
}

pub trait CloudResource {
  fn meta(&self) -> &ResourceMeta;

  fn meta_mut(&mut self) -> &mut ResourceMeta;

  fn kind(&self) -> ResourceKind;

  /// Kind-specific template properties, before extra properties are merged.
  fn base_properties(&self) -> Map<String, Value>;

  fn name(&self) -> &str {
    self.meta().name()
  }

  fn stage(&self) -> &str {
    self.meta().stage()
  }

  fn depends_on(&self) -> &[String] {
    self.meta().depends_on()
  }

  fn add_depends_on(&mut self, name: &str) {
    self.meta_mut().add_depends_on(name);
  }

  fn add_extra_property(&mut self, key: &str, value: Value) {
    self.meta_mut().add_extra_property(key, value);
  }

  /// ARN of this resource with a literal suffix appended.
  fn arn(&self, suffix: &str) -> TemplateValue {
    TemplateValue::get_att(self.name(), "Arn").with_suffix(suffix)
  }

  fn reference(&self) -> TemplateValue {
    TemplateValue::reference(self.name())
  }

  fn attribute(&self, attribute: &str) -> TemplateValue {
    TemplateValue::get_att(self.name(), attribute)
  }

  /// Template properties with extra properties layered on top.
  fn properties(&self) -> Map<String, Value> {
    let mut properties = self.base_properties();
    for (key, value) in self.meta().extra_properties() {
      properties.insert(key.clone(), value.clone());
    }
    properties
  }
}

macro_rules! resource_variants {
  ($($variant:ident($ty:ty)),* $(,)?) => {
    /// Any resource that can appear in a stage template.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Resource {
      $($variant($ty)),*
    }

    impl CloudResource for Resource {
      fn meta(&self) -> &ResourceMeta {
        match self {
          $(Resource::$variant(r) => r.meta()),*
        }
      }

      fn meta_mut(&mut self) -> &mut ResourceMeta {
        match self {
          $(Resource::$variant(r) => r.meta_mut()),*
        }
      }

      fn kind(&self) -> ResourceKind {
        match self {
          $(Resource::$variant(r) => r.kind()),*
        }
      }

      fn base_properties(&self) -> Map<String, Value> {
        match self {
          $(Resource::$variant(r) => r.base_properties()),*
        }
      }

      fn arn(&self, suffix: &str) -> TemplateValue {
        match self {
          $(Resource::$variant(r) => r.arn(suffix)),*
        }
      }
    }

    $(
      impl From<$ty> for Resource {
        fn from(resource: $ty) -> Self {
          Resource::$variant(resource)
        }
      }
    )*
  };
}

resource_variants! {
  Function(FunctionResource),
  IamRole(IamRoleResource),
  LogGroup(LogGroup),
  DeploymentBucket(DeploymentBucket),
  FileBucket(FileBucket),
  Queue(QueueResource),
  Topic(SnsTopic),
  RestApi(RestApi),
  RestResource(RestApiResource),
  RestMethod(RestMethod),
  ApiGatewayDeployment(ApiGatewayDeployment),
  WebSocketApi(WebSocketApi),
  WebSocketDeployment(WebSocketDeployment),
  WebSocketStage(WebSocketStage),
  WebSocketRoute(WebSocketRoute),
  WebSocketIntegration(WebSocketIntegration),
  EventMapping(EventMapping),
  Permission(FunctionPermission),
  CronRule(CronRule),
  KeyValueTable(KeyValueTable),
}

impl Resource {
  pub fn as_function(&self) -> Option<&FunctionResource> {
    match self {
      Resource::Function(f) => Some(f),
      _ => None,
    }
  }

  pub fn as_function_mut(&mut self) -> Option<&mut FunctionResource> {
    match self {
      Resource::Function(f) => Some(f),
      _ => None,
    }
  }

  pub fn as_role(&self) -> Option<&IamRoleResource> {
    match self {
      Resource::IamRole(r) => Some(r),
      _ => None,
    }
  }

  pub fn as_role_mut(&mut self) -> Option<&mut IamRoleResource> {
    match self {
      Resource::IamRole(r) => Some(r),
      _ => None,
    }
  }

  pub fn as_file_bucket(&self) -> Option<&FileBucket> {
    match self {
      Resource::FileBucket(b) => Some(b),
      _ => None,
    }
  }

  pub fn as_file_bucket_mut(&mut self) -> Option<&mut FileBucket> {
    match self {
      Resource::FileBucket(b) => Some(b),
      _ => None,
    }
  }

  pub fn as_topic(&self) -> Option<&SnsTopic> {
    match self {
      Resource::Topic(t) => Some(t),
      _ => None,
    }
  }

  pub fn as_event_mapping(&self) -> Option<&EventMapping> {
    match self {
      Resource::EventMapping(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_queue(&self) -> Option<&QueueResource> {
    match self {
      Resource::Queue(q) => Some(q),
      _ => None,
    }
  }

  pub fn as_table(&self) -> Option<&KeyValueTable> {
    match self {
      Resource::KeyValueTable(t) => Some(t),
      _ => None,
    }
  }

  pub fn as_permission(&self) -> Option<&FunctionPermission> {
    match self {
      Resource::Permission(p) => Some(p),
      _ => None,
    }
  }

  pub fn as_rest_method(&self) -> Option<&RestMethod> {
    match self {
      Resource::RestMethod(m) => Some(m),
      _ => None,
    }
  }
}
