//! Invoking other functions of the same project.
//!
//! The target is addressed by the same physical name synthesis gave it, built
//! from the project name and stage the calling function runs with.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::env::{EnvironmentVariableClient, LazyEnvValue};
use super::error::ClientError;
use crate::consts::{DEFAULT_STAGE, env};
use crate::util::naming::function_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationType {
  RequestResponse,
  Event,
}

pub trait FunctionBackend: Send + Sync {
  /// Invoke `function_name` with a JSON payload. Request/response
  /// invocations return the function's JSON output, if any.
  fn invoke(
    &self,
    function_name: &str,
    payload: &str,
    invocation: InvocationType,
  ) -> Result<Option<String>, ClientError>;
}

pub struct BasicFunctionClient {
  class_name: String,
  method_name: String,
  project_name: LazyEnvValue,
  stage: LazyEnvValue,
  backend: Arc<dyn FunctionBackend>,
  env: Arc<dyn EnvironmentVariableClient>,
}

impl BasicFunctionClient {
  pub fn new(
    class_name: impl Into<String>,
    method_name: impl Into<String>,
    backend: Arc<dyn FunctionBackend>,
    env: Arc<dyn EnvironmentVariableClient>,
  ) -> Self {
    Self {
      class_name: class_name.into(),
      method_name: method_name.into(),
      project_name: LazyEnvValue::new(env::NIMBUS_PROJECT_NAME, ""),
      stage: LazyEnvValue::new(env::FUNCTION_STAGE, DEFAULT_STAGE),
      backend,
      env,
    }
  }

  pub fn function_name(&self) -> String {
    function_name(
      self.project_name.get(self.env.as_ref()),
      &self.class_name,
      &self.method_name,
      self.stage.get(self.env.as_ref()),
    )
  }

  fn call<P: Serialize>(&self, param: &P, invocation: InvocationType) -> Result<Option<String>, ClientError> {
    let name = self.function_name();
    debug!(function = %name, invocation = ?invocation, "invoking function");
    self.backend.invoke(&name, &serde_json::to_string(param)?, invocation)
  }

  /// Synchronous invocation, ignoring the response.
  pub fn invoke<P: Serialize>(&self, param: &P) -> Result<(), ClientError> {
    self.call(param, InvocationType::RequestResponse).map(|_| ())
  }

  /// Synchronous invocation decoding the response as `T`.
  pub fn invoke_for<P: Serialize, T: DeserializeOwned>(&self, param: &P) -> Result<Option<T>, ClientError> {
    match self.call(param, InvocationType::RequestResponse)? {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  pub fn invoke_async<P: Serialize>(&self, param: &P) -> Result<(), ClientError> {
    self.call(param, InvocationType::Event).map(|_| ())
  }
}
