use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::env::{EnvironmentVariableClient, LazyEnvValue};
use super::error::ClientError;
use crate::consts::env;

pub trait QueueBackend: Send + Sync {
  fn send(&self, queue_url: &str, body: &str) -> Result<(), ClientError>;
}

/// Sends to the queue whose URL a consuming function exposes as
/// `NIMBUS_QUEUE_URL_ID_<ID>`.
pub struct QueueClient {
  id: String,
  queue_url: LazyEnvValue,
  backend: Arc<dyn QueueBackend>,
  env: Arc<dyn EnvironmentVariableClient>,
}

impl QueueClient {
  pub fn new(id: impl Into<String>, backend: Arc<dyn QueueBackend>, env: Arc<dyn EnvironmentVariableClient>) -> Self {
    let id = id.into();
    Self {
      queue_url: LazyEnvValue::new(env::queue_url(&id), ""),
      id,
      backend,
      env,
    }
  }

  pub fn queue_url(&self) -> &str {
    self.queue_url.get(self.env.as_ref())
  }

  pub fn send_message(&self, message: &str) -> Result<(), ClientError> {
    debug!(queue = %self.id, "sending message");
    self.backend.send(self.queue_url(), message)
  }

  pub fn send_message_as_json<T: Serialize>(&self, message: &T) -> Result<(), ClientError> {
    self.send_message(&serde_json::to_string(message)?)
  }
}
