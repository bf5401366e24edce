//! Test utilities for nimbus-lib.
//!
//! Builders for the contexts and coordinates most synthesis tests start from.

use crate::config::ProjectConfig;
use crate::consts::DEFAULT_RUNTIME;
use crate::resource::{FunctionConfig, MethodInformation};
use crate::synth::{BuildContext, FunctionId};

pub const TIMESTAMP: &str = "2024-05-01T10:20:30Z";

/// Context for project `shop` knowing the given stages.
pub fn context(stages: &[&str]) -> BuildContext {
  let config = ProjectConfig::new("shop").with_stages(stages.iter().copied());
  BuildContext::new(&config, TIMESTAMP)
}

pub fn method(class_name: &str, method_name: &str) -> MethodInformation {
  MethodInformation {
    class_name: class_name.to_string(),
    qualified_class_name: format!("handlers.{}", class_name),
    method_name: method_name.to_string(),
  }
}

pub fn config(stage: &str, timeout: u32) -> FunctionConfig {
  FunctionConfig {
    timeout,
    memory: 128,
    stage: stage.to_string(),
    runtime: DEFAULT_RUNTIME.to_string(),
  }
}

/// Synthesize `class_name.method_name` in `stage` with a 10 second timeout.
pub fn function(ctx: &mut BuildContext, class_name: &str, method_name: &str, stage: &str) -> FunctionId {
  let handler = format!("handlers.{}::{}", class_name, method_name);
  ctx.new_function(&handler, method(class_name, method_name), config(stage, 10))
}
