//! Publishing to notification topics.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::env::{EnvironmentVariableClient, LazyEnvValue};
use super::error::ClientError;
use crate::consts::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
  Http,
  Https,
  Email,
  EmailJson,
  Sms,
  Sqs,
  Application,
  Lambda,
}

impl fmt::Display for Protocol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Protocol::Http => "http",
      Protocol::Https => "https",
      Protocol::Email => "email",
      Protocol::EmailJson => "email-json",
      Protocol::Sms => "sms",
      Protocol::Sqs => "sqs",
      Protocol::Application => "application",
      Protocol::Lambda => "lambda",
    };
    f.write_str(name)
  }
}

pub trait NotificationBackend: Send + Sync {
  fn publish(&self, topic_arn: &str, message: &str) -> Result<(), ClientError>;

  /// Returns the subscription id.
  fn subscribe(&self, topic_arn: &str, protocol: Protocol, endpoint: &str) -> Result<String, ClientError>;

  fn unsubscribe(&self, subscription_id: &str) -> Result<(), ClientError>;
}

pub struct NotificationClient {
  topic: String,
  topic_arn: LazyEnvValue,
  backend: Arc<dyn NotificationBackend>,
  env: Arc<dyn EnvironmentVariableClient>,
}

impl NotificationClient {
  pub fn new(
    topic: impl Into<String>,
    backend: Arc<dyn NotificationBackend>,
    env: Arc<dyn EnvironmentVariableClient>,
  ) -> Self {
    let topic = topic.into();
    Self {
      topic_arn: LazyEnvValue::new(env::topic_arn(&topic), ""),
      topic,
      backend,
      env,
    }
  }

  pub fn topic(&self) -> &str {
    &self.topic
  }

  pub fn topic_arn(&self) -> &str {
    self.topic_arn.get(self.env.as_ref())
  }

  pub fn notify(&self, message: &str) -> Result<(), ClientError> {
    debug!(topic = %self.topic, "publishing notification");
    self.backend.publish(self.topic_arn(), message)
  }

  pub fn notify_json<T: Serialize>(&self, message: &T) -> Result<(), ClientError> {
    self.notify(&serde_json::to_string(message)?)
  }

  pub fn create_subscription(&self, protocol: Protocol, endpoint: &str) -> Result<String, ClientError> {
    self.backend.subscribe(self.topic_arn(), protocol, endpoint)
  }

  pub fn delete_subscription(&self, subscription_id: &str) -> Result<(), ClientError> {
    self.backend.unsubscribe(subscription_id)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::client::env::StaticEnvironment;
  use crate::client::local::LocalNotificationBackend;

  const ARN: &str = "arn:aws:sns:eu-west-1:1:ordersdev";

  fn client(backend: &Arc<LocalNotificationBackend>) -> NotificationClient {
    let env = StaticEnvironment::new().with("SNS_TOPIC_ARN_ORDERS", ARN);
    NotificationClient::new("orders", backend.clone(), Arc::new(env))
  }

  #[test]
  fn arn_comes_from_upper_cased_variable() {
    let backend = Arc::new(LocalNotificationBackend::new());
    assert_eq!(client(&backend).topic_arn(), ARN);
  }

  #[test]
  fn notify_and_notify_json() {
    let backend = Arc::new(LocalNotificationBackend::new());
    let orders = client(&backend);
    orders.notify("plain").unwrap();
    orders.notify_json(&json!({ "id": 1 })).unwrap();
    assert_eq!(backend.messages(ARN), vec!["plain".to_string(), "{\"id\":1}".to_string()]);
  }

  #[test]
  fn missing_arn_fails_to_publish() {
    let backend = Arc::new(LocalNotificationBackend::new());
    let orders = NotificationClient::new("orders", backend.clone(), Arc::new(StaticEnvironment::new()));
    assert!(matches!(orders.notify("lost"), Err(ClientError::UnknownTarget(_))));
  }

  #[test]
  fn subscriptions_round_trip() {
    let backend = Arc::new(LocalNotificationBackend::new());
    let orders = client(&backend);
    let id = orders.create_subscription(Protocol::EmailJson, "ops@example.com").unwrap();
    assert_eq!(backend.subscriptions(ARN), vec![(Protocol::EmailJson, "ops@example.com".to_string())]);

    orders.delete_subscription(&id).unwrap();
    assert!(backend.subscriptions(ARN).is_empty());
    assert!(matches!(
      orders.delete_subscription(&id),
      Err(ClientError::UnknownSubscription(_))
    ));
  }

  #[test]
  fn protocol_names() {
    assert_eq!(Protocol::EmailJson.to_string(), "email-json");
    assert_eq!(serde_json::to_value(Protocol::EmailJson).unwrap(), "email-json");
  }
}
