//! Shared setup for library integration tests.

use nimbus_lib::config::ProjectConfig;
use nimbus_lib::consts::DEFAULT_RUNTIME;
use nimbus_lib::resource::{FunctionConfig, MethodInformation};
use nimbus_lib::synth::{BuildContext, FunctionId};

pub const TIMESTAMP: &str = "2024-05-01T10:20:30Z";

pub fn context(stages: &[&str]) -> BuildContext {
  let config = ProjectConfig::new("shop").with_stages(stages.iter().copied());
  BuildContext::new(&config, TIMESTAMP)
}

pub fn function(ctx: &mut BuildContext, class_name: &str, method_name: &str, stage: &str, timeout: u32) -> FunctionId {
  let method = MethodInformation {
    class_name: class_name.to_string(),
    qualified_class_name: format!("shop.{}", class_name),
    method_name: method_name.to_string(),
  };
  let config = FunctionConfig {
    timeout,
    memory: 128,
    stage: stage.to_string(),
    runtime: DEFAULT_RUNTIME.to_string(),
  };
  let handler = format!("shop.{}::{}", class_name, method_name);
  ctx.new_function(&handler, method, config)
}
