//! Wiring functions to the functions and resources they call at runtime.
//!
//! Usage wiring only touches the caller's own stage: a usage declared for
//! stages the caller is not deployed to is ignored for that caller.

use std::collections::BTreeSet;

use tracing::debug;

use super::{BuildContext, FunctionId, SynthError};
use crate::consts::env;
use crate::declaration::{Declarations, HandlerCoordinates};
use crate::diagnostic::{DiagnosticSink, SourceLocation};
use crate::resource::{ClientType, CloudResource, KeyValueTable, QueueResource, Resource, SnsTopic, TemplateValue};

impl BuildContext {
  fn applies_to(&self, id: &FunctionId, stages: &BTreeSet<String>) -> bool {
    self.stages.determine_stages(stages).contains(&id.stage)
  }

  /// Let `caller` invoke the basic function `target`.
  ///
  /// A missing target is reported to `sink` at `location`; the caller keeps
  /// its client marker and environment either way.
  pub fn uses_basic_function(
    &mut self,
    caller: &FunctionId,
    target: &HandlerCoordinates,
    stages: &BTreeSet<String>,
    location: Option<&SourceLocation>,
    sink: &mut dyn DiagnosticSink,
  ) -> Result<(), SynthError> {
    let project_name = self.project_name().to_string();
    let function = self.function_mut(caller)?;
    function.add_client(ClientType::BasicFunction);
    function.add_extra_dependency(&format!("{}Serverless", target.qualified_class_name()));

    if !self.applies_to(caller, stages) {
      return Ok(());
    }

    let function = self.function_mut(caller)?;
    function.add_env_variable(env::NIMBUS_PROJECT_NAME, project_name);
    function.add_env_variable(env::FUNCTION_STAGE, caller.stage.as_str());
    let caller_function = function.clone();

    let invoked = self
      .documents
      .get(&caller.stage)
      .and_then(|docs| {
        docs
          .update_resources
          .invokable_function(&target.class_name, &target.method_name)
      })
      .cloned();

    match invoked {
      Some(invoked) => {
        debug!(caller = %caller.name, target = %invoked.name(), "wired function invocation");
        self.role_mut(&caller_function)?.add_allow_statement("lambda:*", &invoked, "");
      }
      None => {
        sink.error(
          format!(
            "{} does not contain a BasicServerlessFunction {}",
            target.class_name, target.method_name
          ),
          location,
        );
      }
    }
    Ok(())
  }

  /// Let `caller` publish to `topic`, creating an unsubscribed topic when no
  /// function of the stage subscribes to it.
  pub fn uses_notification_topic(
    &mut self,
    caller: &FunctionId,
    topic: &str,
    stages: &BTreeSet<String>,
  ) -> Result<(), SynthError> {
    if !self.applies_to(caller, stages) {
      return Ok(());
    }
    let function = self.function(caller)?;

    let docs = self.stage_docs(&caller.stage)?;
    let existing = docs.update_resources.topic_by_name(topic).cloned();
    let resource = match existing {
      Some(existing) => existing,
      None => {
        let created = SnsTopic::standalone(topic, &caller.stage);
        docs.update_resources.add_resource(created.clone());
        created
      }
    };

    self.role_mut(&function)?.add_allow_statement("sns:Publish", &resource, "");
    let function = self.function_mut(caller)?;
    function.add_client(ClientType::NotificationTopic);
    function.add_env_variable(&env::topic_arn(topic), resource.arn(""));
    Ok(())
  }

  /// Let `caller` send to queue `queue_id`. The queue must be consumed by a
  /// function of the stage.
  pub fn uses_queue(&mut self, caller: &FunctionId, queue_id: &str, stages: &BTreeSet<String>) -> Result<(), SynthError> {
    if !self.applies_to(caller, stages) {
      return Ok(());
    }
    let function = self.function(caller)?;
    let queue_name = QueueResource::logical_name(queue_id, &caller.stage);
    let queue = self
      .documents
      .get(&caller.stage)
      .and_then(|docs| docs.update_resources.get(&queue_name))
      .and_then(Resource::as_queue)
      .cloned()
      .ok_or_else(|| SynthError::UnknownQueue {
        id: queue_id.to_string(),
        stage: caller.stage.clone(),
      })?;

    self.role_mut(&function)?.add_allow_statement("sqs:SendMessage", &queue, "");
    let function = self.function_mut(caller)?;
    function.add_client(ClientType::Queue);
    function.add_env_variable(&env::queue_url(queue_id), queue.url());
    Ok(())
  }

  /// Let `caller` read and write the key-value store of data type `store`.
  ///
  /// Stores backed by an external table are granted by ARN.
  pub fn uses_key_value_store(
    &mut self,
    caller: &FunctionId,
    declarations: &Declarations,
    store: &str,
    stages: &BTreeSet<String>,
  ) -> Result<(), SynthError> {
    if !self.applies_to(caller, stages) {
      return Ok(());
    }
    let declaration = declarations.resolve_store(store, &caller.stage)?;
    let function = self.function(caller)?;
    let table_name = declaration.table_name_for(&caller.stage);

    match declaration.existing_arn() {
      Some(arn) => {
        self
          .role_mut(&function)?
          .add_allow_arn("dynamodb:*", &table_name, TemplateValue::literal(arn), "");
      }
      None => {
        let table_logical = KeyValueTable::logical_name(&table_name);
        let table = self
          .documents
          .get(&caller.stage)
          .and_then(|docs| docs.update_resources.get(&table_logical))
          .cloned()
          .ok_or_else(|| SynthError::MissingStoreTable {
            store: store.to_string(),
            stage: caller.stage.clone(),
          })?;
        self.role_mut(&function)?.add_allow_statement("dynamodb:*", &table, "");
      }
    }

    self.function_mut(caller)?.add_client(ClientType::KeyValueStore);
    Ok(())
  }
}
