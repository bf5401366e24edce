//! The deployable resource model.

mod collection;
mod event;
mod function;
mod http;
mod messaging;
mod storage;
mod types;
mod value;
mod websocket;

pub use collection::{OutputCollection, ResourceCollection, TemplateOutput};
pub use event::{CronRule, EventMapping, FunctionPermission, LogGroup};
pub use function::{AllowStatement, ClientType, FunctionConfig, FunctionResource, IamRoleResource, MethodInformation};
pub use http::{ApiGatewayDeployment, RestApi, RestApiResource, RestMethod, RestParent};
pub use messaging::{QueueResource, SnsTopic};
pub use storage::{
  DeploymentBucket, FileBucket, FileStorageEventType, KeyType, KeyValueTable, LambdaConfiguration,
  WebsiteConfiguration,
};
pub use types::{CloudResource, Resource, ResourceKind, ResourceMeta};
pub use value::TemplateValue;
pub use websocket::{WebSocketApi, WebSocketDeployment, WebSocketIntegration, WebSocketRoute, WebSocketStage};
