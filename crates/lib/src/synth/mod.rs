//! Resource graph synthesis.
//!
//! A [`BuildContext`] owns everything one generation run mutates: the build
//! state, the per-stage documents and the stage resolver. Functions are
//! synthesized first, triggers are attached right after their function, and
//! usage wiring between functions runs once every function exists.

mod function;
mod stores;
mod triggers;
mod uses;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::consts::DEFAULT_RUNTIME;
use crate::declaration::{
  Declarations, FunctionDeclaration, InvalidStage, TriggerDeclaration, UsageDeclaration,
};
use crate::diagnostic::{Diagnostic, DiagnosticSink, Severity};
use crate::document::{DocumentSet, StageDocuments};
use crate::resource::{CloudResource, FunctionConfig, FunctionResource, IamRoleResource, MethodInformation};
use crate::stage::StageResolver;
use crate::state::{HandlerInformation, NimbusState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthError {
  #[error("no function has been synthesized for stage {0}")]
  StageNotInitialized(String),

  #[error("unknown function {name} in stage {stage}")]
  UnknownFunction { name: String, stage: String },

  #[error("key-value store {store} has no table in stage {stage}")]
  MissingStoreTable { store: String, stage: String },

  #[error("queue {id} is not consumed by any function in stage {stage}")]
  UnknownQueue { id: String, stage: String },

  #[error("timeout {timeout}s of {function} is too large for the visibility timeout of queue {queue}")]
  VisibilityTimeoutOverflow { queue: String, function: String, timeout: u32 },

  #[error(transparent)]
  InvalidStage(#[from] InvalidStage),
}

/// Handle to a synthesized function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
  pub stage: String,
  pub name: String,
}

/// Forwards diagnostics while counting errors.
struct CountingSink<'a> {
  inner: &'a mut dyn DiagnosticSink,
  errors: usize,
}

impl DiagnosticSink for CountingSink<'_> {
  fn report(&mut self, diagnostic: Diagnostic) {
    if diagnostic.severity == Severity::Error {
      self.errors += 1;
    }
    self.inner.report(diagnostic);
  }
}

/// What a [`BuildContext::generate`] run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
  pub functions: usize,
  pub stages: BTreeSet<String>,
  pub errors: usize,
}

#[derive(Debug, Clone)]
pub struct BuildContext {
  pub state: NimbusState,
  pub documents: DocumentSet,
  pub stages: StageResolver,
}

impl BuildContext {
  pub fn new(config: &ProjectConfig, compilation_timestamp: &str) -> Self {
    let mut state = NimbusState::new(&config.project_name, compilation_timestamp);
    state.cloud_provider = config.cloud_provider;
    state.assemble = config.assemble;
    Self {
      state,
      documents: DocumentSet::new(),
      stages: StageResolver::from_config(config),
    }
  }

  pub fn project_name(&self) -> &str {
    &self.state.project_name
  }

  pub fn timestamp(&self) -> &str {
    &self.state.compilation_timestamp
  }

  fn stage_docs(&mut self, stage: &str) -> Result<&mut StageDocuments, SynthError> {
    self
      .documents
      .get_mut(stage)
      .ok_or_else(|| SynthError::StageNotInitialized(stage.to_string()))
  }

  /// Snapshot of a synthesized function, used to build the resources that
  /// reference it.
  pub fn function(&self, id: &FunctionId) -> Result<FunctionResource, SynthError> {
    self
      .documents
      .get(&id.stage)
      .and_then(|docs| docs.update_resources.function(&id.name))
      .cloned()
      .ok_or_else(|| SynthError::UnknownFunction {
        name: id.name.clone(),
        stage: id.stage.clone(),
      })
  }

  fn function_mut(&mut self, id: &FunctionId) -> Result<&mut FunctionResource, SynthError> {
    let unknown = || SynthError::UnknownFunction {
      name: id.name.clone(),
      stage: id.stage.clone(),
    };
    self
      .documents
      .get_mut(&id.stage)
      .and_then(|docs| docs.update_resources.function_mut(&id.name))
      .ok_or_else(unknown)
  }

  fn role_mut(&mut self, function: &FunctionResource) -> Result<&mut IamRoleResource, SynthError> {
    let unknown = || SynthError::UnknownFunction {
      name: function.name().to_string(),
      stage: function.stage().to_string(),
    };
    self
      .documents
      .get_mut(function.stage())
      .and_then(|docs| docs.update_resources.role_mut(function.role_name()))
      .ok_or_else(unknown)
  }

  /// Synthesize every declaration.
  ///
  /// Cross-reference problems are reported to `sink` and generation carries
  /// on with the next declaration.
  pub fn generate(&mut self, declarations: &Declarations, sink: &mut dyn DiagnosticSink) -> GenerationSummary {
    let mut counting = CountingSink { inner: sink, errors: 0 };
    let sink: &mut dyn DiagnosticSink = &mut counting;

    let tables = self.create_key_value_stores(declarations);
    let buckets = self.create_file_buckets(declarations);
    debug!(tables, buckets, "created declared resources");

    let mut synthesized: Vec<(&FunctionDeclaration, Vec<FunctionId>)> = Vec::new();
    for declaration in &declarations.functions {
      let ids = self.synthesize_declaration(declaration, declarations, sink);
      synthesized.push((declaration, ids));
    }

    for (declaration, ids) in &synthesized {
      for id in ids {
        for usage in &declaration.uses {
          if let Err(e) = self.wire_usage(id, usage, declaration, declarations, sink) {
            sink.error(e.to_string(), declaration.location.as_ref());
          }
        }
      }
    }

    let mut summary = GenerationSummary {
      errors: counting.errors,
      ..Default::default()
    };
    for (declaration, ids) in &synthesized {
      self.record_handler(declaration, ids);
      summary.functions += ids.len();
      summary.stages.extend(ids.iter().map(|id| id.stage.clone()));
    }

    info!(
      functions = summary.functions,
      stages = summary.stages.len(),
      "generated resource graph"
    );
    summary
  }

  fn synthesize_declaration(
    &mut self,
    declaration: &FunctionDeclaration,
    declarations: &Declarations,
    sink: &mut dyn DiagnosticSink,
  ) -> Vec<FunctionId> {
    let method = MethodInformation {
      class_name: declaration.handler.class_name.clone(),
      qualified_class_name: declaration.handler.qualified_class_name(),
      method_name: declaration.handler.method_name.clone(),
    };
    let handler = format!("{}::{}", method.qualified_class_name, method.method_name);

    let mut ids = Vec::new();
    for stage in self.stages.determine_stages(&declaration.stages) {
      let config = FunctionConfig {
        timeout: declaration.timeout,
        memory: declaration.memory,
        stage,
        runtime: DEFAULT_RUNTIME.to_string(),
      };
      let id = self.new_function(&handler, method.clone(), config);
      if let Err(e) = self.wire_trigger(&id, &declaration.trigger, declarations) {
        sink.error(e.to_string(), declaration.location.as_ref());
      }
      ids.push(id);
    }
    ids
  }

  fn wire_trigger(
    &mut self,
    id: &FunctionId,
    trigger: &TriggerDeclaration,
    declarations: &Declarations,
  ) -> Result<(), SynthError> {
    match trigger {
      TriggerDeclaration::Http {
        method,
        path,
        allowed_cors_origin,
      } => {
        self.set_cors_origin(id, allowed_cors_origin.as_deref().unwrap_or_default())?;
        self.new_http_method(method, path, id)
      }
      TriggerDeclaration::Notification { topic } => self.new_notification(topic, id),
      TriggerDeclaration::Queue { id: queue, batch_size } => self.new_queue(queue, *batch_size, id).map(|_| ()),
      TriggerDeclaration::Store { store } => {
        let declaration = declarations.resolve_store(store, &id.stage)?;
        self.new_store_trigger(store, &declaration.table_name_for(&id.stage), id)
      }
      TriggerDeclaration::Cron { expression } => self.new_cron_trigger(expression, id),
      TriggerDeclaration::File { bucket, event_type } => self.new_file_trigger(bucket, *event_type, id),
      TriggerDeclaration::WebSocket { route_key } => self.new_websocket_route(route_key, id),
      TriggerDeclaration::Basic => self.new_basic(id),
    }
  }

  fn wire_usage(
    &mut self,
    id: &FunctionId,
    usage: &UsageDeclaration,
    declaration: &FunctionDeclaration,
    declarations: &Declarations,
    sink: &mut dyn DiagnosticSink,
  ) -> Result<(), SynthError> {
    match usage {
      UsageDeclaration::BasicFunction { target, stages } => {
        self.uses_basic_function(id, target, stages, declaration.location.as_ref(), sink)
      }
      UsageDeclaration::NotificationTopic { topic, stages } => self.uses_notification_topic(id, topic, stages),
      UsageDeclaration::Queue { id: queue, stages } => self.uses_queue(id, queue, stages),
      UsageDeclaration::KeyValueStore { store, stages } => self.uses_key_value_store(id, declarations, store, stages),
    }
  }

  /// One handler entry per declaration, carrying the clients and extra
  /// dependencies its functions picked up across stages.
  fn record_handler(&mut self, declaration: &FunctionDeclaration, ids: &[FunctionId]) {
    let Some(first) = ids.first().and_then(|id| self.function(id).ok()) else {
      return;
    };
    let mut handler = HandlerInformation {
      handler_class_path: first.method().qualified_class_name.clone(),
      handler_file: first.method().handler_file(),
      replacement_variable: first.method().replacement_variable(),
      stages: ids.iter().map(|id| id.stage.clone()).collect(),
      uses_clients: BTreeSet::new(),
      extra_dependencies: BTreeSet::new(),
    };
    for function in ids.iter().filter_map(|id| self.function(id).ok()) {
      handler.uses_clients.extend(function.clients().iter().copied());
      handler.extra_dependencies.extend(function.extra_dependencies().iter().cloned());
    }
    debug!(handler = %handler.handler_file, stages = ?declaration.stages, "recorded handler");
    self.state.add_handler(handler);
  }
}
