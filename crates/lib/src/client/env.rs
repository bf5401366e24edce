//! Environment lookup for runtime clients.
//!
//! Clients never read the process environment directly. They go through an
//! [`EnvironmentVariableClient`] so tests and local runs can supply values,
//! and memoize what they read with [`LazyEnvValue`].

use std::collections::HashMap;
use std::sync::OnceLock;

pub trait EnvironmentVariableClient: Send + Sync {
  fn get(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentVariableClient for ProcessEnvironment {
  fn get(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }
}

/// Fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct StaticEnvironment {
  values: HashMap<String, String>,
}

impl StaticEnvironment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.values.insert(name.into(), value.into());
    self
  }
}

impl EnvironmentVariableClient for StaticEnvironment {
  fn get(&self, name: &str) -> Option<String> {
    self.values.get(name).cloned()
  }
}

/// A variable read at most once. Absent variables resolve to the default.
#[derive(Debug)]
pub struct LazyEnvValue {
  name: String,
  default: String,
  value: OnceLock<String>,
}

impl LazyEnvValue {
  pub fn new(name: impl Into<String>, default: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      default: default.into(),
      value: OnceLock::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn get(&self, env: &dyn EnvironmentVariableClient) -> &str {
    self
      .value
      .get_or_init(|| env.get(&self.name).unwrap_or_else(|| self.default.clone()))
  }
}

#[cfg(test)]
mod tests {
  use serial_test::serial;

  use super::*;

  #[test]
  #[serial]
  fn process_environment_reads_variables() {
    temp_env::with_var("NIMBUS_TEST_VALUE", Some("present"), || {
      assert_eq!(ProcessEnvironment.get("NIMBUS_TEST_VALUE").as_deref(), Some("present"));
    });
    temp_env::with_var_unset("NIMBUS_TEST_VALUE", || {
      assert_eq!(ProcessEnvironment.get("NIMBUS_TEST_VALUE"), None);
    });
  }

  #[test]
  fn absent_variable_uses_default() {
    let value = LazyEnvValue::new("FUNCTION_STAGE", "dev");
    assert_eq!(value.get(&StaticEnvironment::new()), "dev");
  }

  #[test]
  fn first_read_is_memoized() {
    let value = LazyEnvValue::new("FUNCTION_STAGE", "dev");
    let first = StaticEnvironment::new().with("FUNCTION_STAGE", "prod");
    let second = StaticEnvironment::new().with("FUNCTION_STAGE", "staging");
    assert_eq!(value.get(&first), "prod");
    assert_eq!(value.get(&second), "prod");
  }

  #[test]
  #[serial]
  fn memoized_across_threads() {
    let value = std::sync::Arc::new(LazyEnvValue::new("NIMBUS_PROJECT_NAME", ""));
    temp_env::with_var("NIMBUS_PROJECT_NAME", Some("shop"), || {
      let handles: Vec<_> = (0..4)
        .map(|_| {
          let value = value.clone();
          std::thread::spawn(move || value.get(&ProcessEnvironment).to_string())
        })
        .collect();
      for handle in handles {
        assert_eq!(handle.join().unwrap(), "shop");
      }
    });
  }
}
