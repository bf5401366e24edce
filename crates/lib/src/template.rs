//! Template rendering and deployment ordering.
//!
//! A stage's collections render to CloudFormation JSON. The depends-on edges
//! between resources form a graph that must stay acyclic; [`DeploymentGraph`]
//! checks that and yields the order (or parallel waves) a deployer would
//! create the resources in.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use crate::consts::TEMPLATE_FORMAT_VERSION;
use crate::document::{RenderedStage, StageDocuments};
use crate::resource::{CloudResource, OutputCollection, ResourceCollection};
use crate::util::hash::ObjectHash;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
  #[error("dependency cycle detected involving {0}")]
  CycleDetected(String),

  #[error("{resource} depends on {dependency}, which is not in the template")]
  UnknownDependency { resource: String, dependency: String },

  #[error("failed to hash template: {0}")]
  Hash(String),
}

/// Render a collection and its outputs as a CloudFormation template.
pub fn render_template(resources: &ResourceCollection, outputs: &OutputCollection) -> Value {
  let mut rendered_resources = Map::new();
  for resource in resources.iter() {
    let mut entry = Map::new();
    entry.insert("Type".to_string(), json!(resource.kind().cfn_type()));
    entry.insert("Properties".to_string(), Value::Object(resource.properties()));
    if !resource.depends_on().is_empty() {
      entry.insert("DependsOn".to_string(), json!(resource.depends_on()));
    }
    rendered_resources.insert(resource.name().to_string(), Value::Object(entry));
  }

  let mut template = Map::new();
  template.insert("AWSTemplateFormatVersion".to_string(), json!(TEMPLATE_FORMAT_VERSION));
  template.insert("Resources".to_string(), Value::Object(rendered_resources));

  if !outputs.is_empty() {
    let mut rendered_outputs = Map::new();
    for output in outputs.iter() {
      let mut entry = Map::new();
      entry.insert("Value".to_string(), output.value.to_json());
      if let Some(export) = &output.export_name {
        entry.insert("Export".to_string(), json!({ "Name": export }));
      }
      rendered_outputs.insert(output.name.clone(), Value::Object(entry));
    }
    template.insert("Outputs".to_string(), Value::Object(rendered_outputs));
  }

  Value::Object(template)
}

/// Render both templates of a stage after checking each is deployable.
pub fn render_stage(stage: &str, documents: &StageDocuments) -> Result<RenderedStage, TemplateError> {
  DeploymentGraph::from_collection(&documents.create_resources)?.verify_acyclic()?;
  DeploymentGraph::from_collection(&documents.update_resources)?.verify_acyclic()?;
  debug!(
    stage = %stage,
    create = documents.create_resources.len(),
    update = documents.update_resources.len(),
    "rendering stage templates"
  );
  Ok(RenderedStage {
    stage: stage.to_string(),
    create: render_template(&documents.create_resources, &documents.create_outputs),
    update: render_template(&documents.update_resources, &documents.update_outputs),
  })
}

/// Content hash of a rendered template.
pub fn template_hash(template: &Value) -> Result<ObjectHash, TemplateError> {
  ObjectHash::of(template).map_err(|e| TemplateError::Hash(e.to_string()))
}

/// Logical names of a collection in an order where every resource follows
/// the resources it depends on.
pub fn deployment_order(resources: &ResourceCollection) -> Result<Vec<String>, TemplateError> {
  DeploymentGraph::from_collection(resources)?.topological_names()
}

/// Depends-on graph of one collection. Edges point from a dependency to its
/// dependent.
pub struct DeploymentGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl DeploymentGraph {
  pub fn from_collection(resources: &ResourceCollection) -> Result<Self, TemplateError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for name in resources.names() {
      let idx = graph.add_node(name.to_string());
      nodes.insert(name.to_string(), idx);
    }

    for resource in resources.iter() {
      let to = nodes[resource.name()];
      for dependency in resource.depends_on() {
        let Some(&from) = nodes.get(dependency) else {
          return Err(TemplateError::UnknownDependency {
            resource: resource.name().to_string(),
            dependency: dependency.clone(),
          });
        };
        graph.add_edge(from, to, ());
      }
    }

    Ok(Self { graph, nodes })
  }

  pub fn verify_acyclic(&self) -> Result<(), TemplateError> {
    self.topological_names().map(|_| ())
  }

  pub fn topological_names(&self) -> Result<Vec<String>, TemplateError> {
    let sorted = toposort(&self.graph, None)
      .map_err(|cycle| TemplateError::CycleDetected(self.graph[cycle.node_id()].clone()))?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Resources grouped into waves: everything in a wave only depends on
  /// earlier waves. Within a wave names keep collection order.
  pub fn waves(&self) -> Result<Vec<Vec<String>>, TemplateError> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let mut ready: Vec<NodeIndex> = remaining.iter().filter(|idx| in_degree[*idx] == 0).copied().collect();
      if ready.is_empty() {
        let stuck = remaining.iter().map(|idx| self.graph[*idx].clone()).min().unwrap_or_default();
        return Err(TemplateError::CycleDetected(stuck));
      }
      ready.sort();

      for idx in &ready {
        remaining.remove(idx);
        for neighbor in self.graph.neighbors_directed(*idx, Direction::Outgoing) {
          if let Some(degree) = in_degree.get_mut(&neighbor) {
            *degree = degree.saturating_sub(1);
          }
        }
      }
      waves.push(ready.into_iter().map(|idx| self.graph[idx].clone()).collect());
    }

    Ok(waves)
  }

  /// Direct dependencies of a resource.
  pub fn dependencies(&self, name: &str) -> Vec<String> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };
    let mut dependencies: Vec<String> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|dep| self.graph[dep].clone())
      .collect();
    dependencies.sort();
    dependencies
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }
}
