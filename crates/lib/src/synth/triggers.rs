//! Attaching triggers to synthesized functions.
//!
//! Every trigger follows the same shape: create or reuse the trigger resource,
//! bind the function to it, add a permission for the trigger's service and
//! grant the function's role what it needs to consume events. Permissions and
//! event mappings are not deduplicated, so registering the same trigger twice
//! yields two of each.

use serde_json::json;
use tracing::debug;

use super::{BuildContext, FunctionId, SynthError};
use crate::consts::{QUEUE_VISIBILITY_MULTIPLIER, STREAM_BATCH_SIZE, STREAM_VIEW_TYPE, env, exports};
use crate::resource::{
  ApiGatewayDeployment, CloudResource, CronRule, EventMapping, FileBucket, FileStorageEventType, FunctionPermission,
  KeyValueTable, QueueResource, Resource, ResourceKind, RestApi, RestApiResource, RestMethod, RestParent, SnsTopic,
  TemplateValue, WebSocketApi, WebSocketDeployment, WebSocketIntegration, WebSocketRoute, WebSocketStage,
};
use crate::state::ExportInformation;
use crate::util::naming::path_key;

const REST_API_URL_OUTPUT: &str = "RestApiUrl";
const WEBSOCKET_API_URL_OUTPUT: &str = "WebSocketApiUrl";

impl BuildContext {
  /// Set the CORS origin a HTTP function answers with. An origin naming a
  /// file bucket of the stage resolves to that bucket's website URL.
  pub fn set_cors_origin(&mut self, id: &FunctionId, origin: &str) -> Result<(), SynthError> {
    let website = self
      .documents
      .get(&id.stage)
      .and_then(|docs| docs.update_resources.get(&FileBucket::logical_name(origin, &id.stage)))
      .and_then(Resource::as_file_bucket)
      .map(FileBucket::website_url);
    let value = website.unwrap_or_else(|| TemplateValue::literal(origin));
    self.function_mut(id)?.add_env_variable(env::NIMBUS_ALLOWED_CORS_ORIGIN, value);
    Ok(())
  }

  pub fn new_http_method(&mut self, http_method: &str, path: &str, id: &FunctionId) -> Result<(), SynthError> {
    let function = self.function(id)?;
    let api = RestApi::new(self.project_name(), &id.stage);
    let export_name = format!("{}-{}-{}", self.project_name(), id.stage, REST_API_URL_OUTPUT);
    let timestamp = self.timestamp().to_string();

    let docs = self.stage_docs(&id.stage)?;
    let created_api = docs.rest_api.is_none();
    if created_api {
      docs.rest_api = Some(api.name().to_string());
      docs.update_resources.add_resource(api.clone());
      docs
        .update_outputs
        .add_output(REST_API_URL_OUTPUT, api.url(), Some(export_name.clone()));
    }

    let deployment_name = match &docs.api_gateway_deployment {
      Some(name) => name.clone(),
      None => {
        let deployment = ApiGatewayDeployment::new(&api, &timestamp);
        let name = deployment.name().to_string();
        docs.update_resources.add_resource(deployment);
        docs.api_gateway_deployment = Some(name.clone());
        name
      }
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut parent = RestParent::Root {
      api: api.name().to_string(),
    };
    let mut key = docs.rest_path_key("", String::new());
    for end in 1..=segments.len() {
      key = docs.rest_path_key(&segments[..end].join("/"), path_key(&segments[..end]));
      let node = RestApiResource::new(parent, &key, segments[end - 1], &id.stage);
      parent = RestParent::Resource {
        api: api.name().to_string(),
        resource: node.name().to_string(),
      };
      docs.update_resources.add_resource(node);
    }

    let method = RestMethod::new(parent, &key, http_method, &function);
    if let Some(deployment) = docs.update_resources.get_mut(&deployment_name) {
      deployment.add_depends_on(method.name());
    }
    debug!(stage = %id.stage, method = %method.http_method(), path, "registered http method");
    docs.update_resources.add_resource(method);

    let permission_name = docs
      .update_resources
      .unique_name(&FunctionPermission::base_name(&function, &api));
    docs
      .update_resources
      .add_resource(FunctionPermission::new(permission_name, &function, &api));

    if created_api {
      self.state.add_export(
        &id.stage,
        ExportInformation {
          export_name,
          export_message: "Created REST API. Base URL is ".to_string(),
          export_value: exports::REST_API_URL.to_string(),
        },
      );
    }
    Ok(())
  }

  pub fn new_notification(&mut self, topic: &str, id: &FunctionId) -> Result<(), SynthError> {
    let function = self.function(id)?;
    let topic = SnsTopic::for_function(topic, &function);

    let docs = self.stage_docs(&id.stage)?;
    let permission_name = docs
      .update_resources
      .unique_name(&FunctionPermission::base_name(&function, &topic));
    let permission = FunctionPermission::new(permission_name, &function, &topic);
    docs.update_resources.add_resource(topic);
    docs.update_resources.add_resource(permission);
    Ok(())
  }

  /// Returns the logical name of the queue.
  pub fn new_queue(&mut self, queue_id: &str, batch_size: u32, id: &FunctionId) -> Result<String, SynthError> {
    let function = self.function(id)?;
    let visibility_timeout = function
      .timeout()
      .checked_mul(QUEUE_VISIBILITY_MULTIPLIER)
      .ok_or_else(|| SynthError::VisibilityTimeoutOverflow {
        queue: queue_id.to_string(),
        function: function.name().to_string(),
        timeout: function.timeout(),
      })?;
    let queue = QueueResource::new(queue_id, visibility_timeout, &id.stage);

    let docs = self.stage_docs(&id.stage)?;
    let mapping_name = docs
      .update_resources
      .unique_name(&EventMapping::base_name(&function, queue.name()));
    let mapping = EventMapping::new(mapping_name, queue.arn(""), queue.name(), batch_size, &function, false);
    docs.update_resources.add_resource(queue.clone());
    docs.update_resources.add_resource(mapping);

    let role = self.role_mut(&function)?;
    role.add_allow_statement("sqs:ReceiveMessage", &queue, "");
    role.add_allow_statement("sqs:DeleteMessage", &queue, "");
    role.add_allow_statement("sqs:GetQueueAttributes", &queue, "");
    Ok(queue.name().to_string())
  }

  /// Consume the change stream of the table backing store `store`.
  pub fn new_store_trigger(&mut self, store: &str, table_name: &str, id: &FunctionId) -> Result<(), SynthError> {
    let function = self.function(id)?;
    let table_logical = KeyValueTable::logical_name(table_name);

    let docs = self.stage_docs(&id.stage)?;
    let table = docs
      .update_resources
      .get_mut(&table_logical)
      .filter(|r| r.kind() == ResourceKind::KeyValueTable)
      .ok_or_else(|| SynthError::MissingStoreTable {
        store: store.to_string(),
        stage: id.stage.clone(),
      })?;
    table.add_extra_property("StreamSpecification", json!({ "StreamViewType": STREAM_VIEW_TYPE }));
    let stream_arn = table.attribute("StreamArn");

    let mapping_name = docs
      .update_resources
      .unique_name(&EventMapping::base_name(&function, &table_logical));
    let mapping = EventMapping::new(
      mapping_name,
      stream_arn.clone(),
      &table_logical,
      STREAM_BATCH_SIZE,
      &function,
      true,
    );
    docs.update_resources.add_resource(mapping);

    self
      .role_mut(&function)?
      .add_allow_arn("dynamodb:*", &table_logical, stream_arn, "");
    Ok(())
  }

  pub fn new_cron_trigger(&mut self, expression: &str, id: &FunctionId) -> Result<(), SynthError> {
    let function = self.function(id)?;
    let rule = CronRule::new(expression, &function);

    let docs = self.stage_docs(&id.stage)?;
    let permission_name = docs
      .update_resources
      .unique_name(&FunctionPermission::base_name(&function, &rule));
    let permission = FunctionPermission::new(permission_name, &function, &rule);
    docs.update_resources.add_resource(rule);
    docs.update_resources.add_resource(permission);
    Ok(())
  }

  /// Notify the function of object events in bucket `bucket`, creating the
  /// bucket if no earlier declaration or trigger did.
  pub fn new_file_trigger(
    &mut self,
    bucket: &str,
    event_type: FileStorageEventType,
    id: &FunctionId,
  ) -> Result<(), SynthError> {
    let function = self.function(id)?;
    let bucket_logical = FileBucket::logical_name(bucket, &id.stage);

    let docs = self.stage_docs(&id.stage)?;
    let mut target = docs
      .update_resources
      .get(&bucket_logical)
      .and_then(Resource::as_file_bucket)
      .cloned()
      .unwrap_or_else(|| FileBucket::new(bucket, &id.stage));

    let permission_name = docs
      .update_resources
      .unique_name(&FunctionPermission::base_name(&function, &target));
    let permission = FunctionPermission::new(permission_name, &function, &target);
    target.add_lambda_configuration(event_type, &function);
    target.add_depends_on(function.name());
    target.add_depends_on(permission.name());

    docs.update_resources.add_resource(permission);
    docs.update_resources.add_resource(target);
    Ok(())
  }

  pub fn new_websocket_route(&mut self, route_key: &str, id: &FunctionId) -> Result<(), SynthError> {
    let function = self.function(id)?;
    let api = WebSocketApi::new(self.project_name(), &id.stage);
    let export_name = format!("{}-{}-{}", self.project_name(), id.stage, WEBSOCKET_API_URL_OUTPUT);
    let timestamp = self.timestamp().to_string();

    let docs = self.stage_docs(&id.stage)?;
    let created_api = docs.websocket_api.is_none();
    if created_api {
      docs.websocket_api = Some(api.name().to_string());
      docs.update_resources.add_resource(api.clone());
      docs
        .update_outputs
        .add_output(WEBSOCKET_API_URL_OUTPUT, api.url(), Some(export_name.clone()));
    }

    let deployment_name = match &docs.websocket_deployment {
      Some(name) => name.clone(),
      None => {
        let deployment = WebSocketDeployment::new(&api, &timestamp);
        let stage = WebSocketStage::new(&api, &deployment);
        let name = deployment.name().to_string();
        docs.update_resources.add_resource(deployment);
        docs.update_resources.add_resource(stage);
        docs.websocket_deployment = Some(name.clone());
        name
      }
    };

    let integration = WebSocketIntegration::new(&api, &function, route_key);
    let route = WebSocketRoute::new(&api, &integration, route_key);
    if let Some(deployment) = docs.update_resources.get_mut(&deployment_name) {
      deployment.add_depends_on(route.name());
    }
    docs.update_resources.add_resource(integration);
    docs.update_resources.add_resource(route);

    let permission_name = docs
      .update_resources
      .unique_name(&FunctionPermission::base_name(&function, &api));
    docs
      .update_resources
      .add_resource(FunctionPermission::new(permission_name, &function, &api));

    if created_api {
      self.state.add_export(
        &id.stage,
        ExportInformation {
          export_name,
          export_message: "Created WebSocket API. Base URL is ".to_string(),
          export_value: exports::WEBSOCKET_API_URL.to_string(),
        },
      );
    }
    Ok(())
  }

  /// A function without a trigger, invoked directly by other functions.
  pub fn new_basic(&mut self, id: &FunctionId) -> Result<(), SynthError> {
    self.function_mut(id)?.mark_invokable();
    Ok(())
  }
}
