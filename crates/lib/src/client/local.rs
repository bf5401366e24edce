//! In-process backends for running and testing handlers without a cloud
//! account. All of them are safe to share between threads.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::error::ClientError;
use super::function::{FunctionBackend, InvocationType};
use super::keyvalue::{Item, KeyValueBackend, ReadItemRequest, WriteItemRequest, WriteOperation, apply_delta};
use super::notification::{NotificationBackend, Protocol};
use super::queue::QueueBackend;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ClientError> {
  mutex
    .lock()
    .map_err(|_| ClientError::Backend("local backend lock poisoned".to_string()))
}

type Table = BTreeMap<String, Item>;

/// Tables of items keyed by their encoded key.
#[derive(Debug, Default)]
pub struct LocalKeyValueBackend {
  tables: Mutex<HashMap<String, Table>>,
}

impl LocalKeyValueBackend {
  pub fn new() -> Self {
    Self::default()
  }

  fn storage_key(key: &Item) -> Result<String, ClientError> {
    Ok(serde_json::to_string(key)?)
  }

  /// Check the request against `tables` and compute its effect without
  /// applying it: `Some(item)` to store, `None` to remove.
  fn plan(tables: &HashMap<String, Table>, request: &WriteItemRequest) -> Result<Option<Item>, ClientError> {
    let storage_key = Self::storage_key(&request.key)?;
    let current = tables.get(&request.table).and_then(|table| table.get(&storage_key));

    if let Some(condition) = &request.condition
      && !condition.evaluate(current)
    {
      return Err(ClientError::ConditionFailed {
        table: request.table.clone(),
        condition: condition.to_string(),
      });
    }

    match &request.operation {
      WriteOperation::Put(item) => Ok(Some(item.clone())),
      WriteOperation::Delete => Ok(None),
      WriteOperation::ApplyDelta { field, amount, sign } => {
        let not_numeric = || ClientError::NotNumeric {
          table: request.table.clone(),
          field: field.clone(),
        };
        let mut item = current.cloned().ok_or_else(not_numeric)?;
        let updated = match item.get(field) {
          Some(Value::Number(n)) => apply_delta(n, amount, *sign).ok_or_else(not_numeric)?,
          _ => return Err(not_numeric()),
        };
        item.insert(field.clone(), Value::Number(updated));
        Ok(Some(item))
      }
    }
  }

  fn apply(tables: &mut HashMap<String, Table>, request: &WriteItemRequest, effect: Option<Item>) -> Result<(), ClientError> {
    let storage_key = Self::storage_key(&request.key)?;
    let table = tables.entry(request.table.clone()).or_default();
    match effect {
      Some(item) => {
        table.insert(storage_key, item);
      }
      None => {
        table.remove(&storage_key);
      }
    }
    Ok(())
  }
}

impl KeyValueBackend for LocalKeyValueBackend {
  fn get_item(&self, request: &ReadItemRequest) -> Result<Option<Item>, ClientError> {
    let storage_key = Self::storage_key(&request.key)?;
    let tables = lock(&self.tables)?;
    Ok(tables.get(&request.table).and_then(|table| table.get(&storage_key)).cloned())
  }

  fn scan(&self, table: &str) -> Result<Vec<Item>, ClientError> {
    let tables = lock(&self.tables)?;
    Ok(tables.get(table).map(|t| t.values().cloned().collect()).unwrap_or_default())
  }

  fn write_item(&self, request: WriteItemRequest) -> Result<(), ClientError> {
    let mut tables = lock(&self.tables)?;
    let effect = Self::plan(&tables, &request)?;
    Self::apply(&mut tables, &request, effect)
  }

  fn transact_write(&self, requests: Vec<WriteItemRequest>) -> Result<(), ClientError> {
    let mut tables = lock(&self.tables)?;
    // Plan against a scratch copy so later requests see earlier effects.
    let mut scratch = tables.clone();
    for request in &requests {
      let effect = Self::plan(&scratch, request)?;
      Self::apply(&mut scratch, request, effect)?;
    }
    *tables = scratch;
    Ok(())
  }

  fn transact_read(&self, requests: &[ReadItemRequest]) -> Result<Vec<Option<Item>>, ClientError> {
    let tables = lock(&self.tables)?;
    requests
      .iter()
      .map(|request| -> Result<Option<Item>, ClientError> {
        let storage_key = Self::storage_key(&request.key)?;
        Ok(tables.get(&request.table).and_then(|table| table.get(&storage_key)).cloned())
      })
      .collect()
  }
}

#[derive(Debug, Clone)]
struct Subscription {
  topic_arn: String,
  protocol: Protocol,
  endpoint: String,
}

#[derive(Debug, Default)]
struct TopicState {
  messages: HashMap<String, Vec<String>>,
  subscriptions: BTreeMap<String, Subscription>,
  next_subscription: u64,
}

#[derive(Debug, Default)]
pub struct LocalNotificationBackend {
  state: Mutex<TopicState>,
}

impl LocalNotificationBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Messages published to a topic, oldest first.
  pub fn messages(&self, topic_arn: &str) -> Vec<String> {
    lock(&self.state)
      .map(|state| state.messages.get(topic_arn).cloned().unwrap_or_default())
      .unwrap_or_default()
  }

  pub fn subscriptions(&self, topic_arn: &str) -> Vec<(Protocol, String)> {
    lock(&self.state)
      .map(|state| {
        state
          .subscriptions
          .values()
          .filter(|s| s.topic_arn == topic_arn)
          .map(|s| (s.protocol, s.endpoint.clone()))
          .collect()
      })
      .unwrap_or_default()
  }
}

impl NotificationBackend for LocalNotificationBackend {
  fn publish(&self, topic_arn: &str, message: &str) -> Result<(), ClientError> {
    if topic_arn.is_empty() {
      return Err(ClientError::UnknownTarget("topic with no ARN".to_string()));
    }
    let mut state = lock(&self.state)?;
    state
      .messages
      .entry(topic_arn.to_string())
      .or_default()
      .push(message.to_string());
    Ok(())
  }

  fn subscribe(&self, topic_arn: &str, protocol: Protocol, endpoint: &str) -> Result<String, ClientError> {
    if topic_arn.is_empty() {
      return Err(ClientError::UnknownTarget("topic with no ARN".to_string()));
    }
    let mut state = lock(&self.state)?;
    state.next_subscription += 1;
    let id = format!("{}:{}", topic_arn, state.next_subscription);
    state.subscriptions.insert(
      id.clone(),
      Subscription {
        topic_arn: topic_arn.to_string(),
        protocol,
        endpoint: endpoint.to_string(),
      },
    );
    Ok(id)
  }

  fn unsubscribe(&self, subscription_id: &str) -> Result<(), ClientError> {
    let mut state = lock(&self.state)?;
    state
      .subscriptions
      .remove(subscription_id)
      .map(|_| ())
      .ok_or_else(|| ClientError::UnknownSubscription(subscription_id.to_string()))
  }
}

#[derive(Debug, Default)]
pub struct LocalQueueBackend {
  queues: Mutex<HashMap<String, VecDeque<String>>>,
}

impl LocalQueueBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Take the oldest message of a queue.
  pub fn receive(&self, queue_url: &str) -> Option<String> {
    lock(&self.queues)
      .ok()
      .and_then(|mut queues| queues.get_mut(queue_url).and_then(VecDeque::pop_front))
  }

  pub fn len(&self, queue_url: &str) -> usize {
    lock(&self.queues)
      .map(|queues| queues.get(queue_url).map(VecDeque::len).unwrap_or_default())
      .unwrap_or_default()
  }

  pub fn is_empty(&self, queue_url: &str) -> bool {
    self.len(queue_url) == 0
  }
}

impl QueueBackend for LocalQueueBackend {
  fn send(&self, queue_url: &str, body: &str) -> Result<(), ClientError> {
    if queue_url.is_empty() {
      return Err(ClientError::UnknownTarget("queue with no URL".to_string()));
    }
    lock(&self.queues)?
      .entry(queue_url.to_string())
      .or_default()
      .push_back(body.to_string());
    Ok(())
  }
}

type Handler = Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Functions registered by physical name and run in-process.
#[derive(Default)]
pub struct LocalFunctionBackend {
  handlers: Mutex<HashMap<String, Handler>>,
  invocations: Mutex<HashMap<String, Vec<String>>>,
}

impl LocalFunctionBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<F>(&self, function_name: &str, handler: F)
  where
    F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
  {
    if let Ok(mut handlers) = lock(&self.handlers) {
      handlers.insert(function_name.to_string(), Box::new(handler));
    }
  }

  /// Payloads a function was invoked with, oldest first.
  pub fn invocations(&self, function_name: &str) -> Vec<String> {
    lock(&self.invocations)
      .map(|calls| calls.get(function_name).cloned().unwrap_or_default())
      .unwrap_or_default()
  }
}

impl FunctionBackend for LocalFunctionBackend {
  fn invoke(
    &self,
    function_name: &str,
    payload: &str,
    invocation: InvocationType,
  ) -> Result<Option<String>, ClientError> {
    let input: Value = serde_json::from_str(payload)?;
    let output = {
      let handlers = lock(&self.handlers)?;
      let handler = handlers
        .get(function_name)
        .ok_or_else(|| ClientError::UnknownTarget(function_name.to_string()))?;
      handler(input).map_err(|message| ClientError::FunctionFailed {
        function: function_name.to_string(),
        message,
      })?
    };
    lock(&self.invocations)?
      .entry(function_name.to_string())
      .or_default()
      .push(payload.to_string());

    match invocation {
      InvocationType::RequestResponse if !output.is_null() => Ok(Some(serde_json::to_string(&output)?)),
      _ => Ok(None),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::thread;

  use serde_json::json;

  use super::*;
  use crate::client::condition::{Comparison, Condition};
  use crate::client::keyvalue::Sign;

  fn key(id: i64) -> Item {
    let mut key = Item::new();
    key.insert("id".to_string(), json!(id));
    key
  }

  fn put(id: i64, count: i64) -> WriteItemRequest {
    let mut item = key(id);
    item.insert("count".to_string(), json!(count));
    WriteItemRequest {
      table: "Counters".to_string(),
      key: key(id),
      operation: WriteOperation::Put(item),
      condition: None,
    }
  }

  fn bump(id: i64) -> WriteItemRequest {
    WriteItemRequest {
      table: "Counters".to_string(),
      key: key(id),
      operation: WriteOperation::ApplyDelta {
        field: "count".to_string(),
        amount: 1.into(),
        sign: Sign::Plus,
      },
      condition: None,
    }
  }

  #[test]
  fn transaction_sees_its_own_writes() {
    let backend = LocalKeyValueBackend::new();
    backend.transact_write(vec![put(1, 0), bump(1), bump(1)]).unwrap();
    let read = ReadItemRequest {
      table: "Counters".to_string(),
      key: key(1),
    };
    assert_eq!(backend.get_item(&read).unwrap().unwrap()["count"], 2);
  }

  #[test]
  fn concurrent_increments_are_not_lost() {
    let backend = Arc::new(LocalKeyValueBackend::new());
    backend.write_item(put(1, 0)).unwrap();

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let backend = backend.clone();
        thread::spawn(move || {
          for _ in 0..25 {
            backend.write_item(bump(1)).unwrap();
          }
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    let items = backend.scan("Counters").unwrap();
    assert_eq!(items[0]["count"], 200);
  }

  #[test]
  fn conditional_put_on_missing_item() {
    let backend = LocalKeyValueBackend::new();
    let mut guarded = put(1, 5);
    guarded.condition = Some(Condition::column("count", Comparison::Less, 10));
    assert!(matches!(backend.write_item(guarded), Err(ClientError::ConditionFailed { .. })));
    assert!(backend.scan("Counters").unwrap().is_empty());
  }

  #[test]
  fn unknown_table_scans_empty() {
    assert!(LocalKeyValueBackend::new().scan("Nothing").unwrap().is_empty());
  }

  #[test]
  fn queue_is_fifo() {
    let backend = LocalQueueBackend::new();
    backend.send("q", "a").unwrap();
    backend.send("q", "b").unwrap();
    assert_eq!(backend.receive("q").as_deref(), Some("a"));
    assert_eq!(backend.len("q"), 1);
    assert!(backend.is_empty("other"));
  }

  #[test]
  fn null_output_has_no_response() {
    let backend = LocalFunctionBackend::new();
    backend.register("f", |_| Ok(Value::Null));
    assert_eq!(backend.invoke("f", "{}", InvocationType::RequestResponse).unwrap(), None);
    assert_eq!(backend.invocations("f"), vec!["{}".to_string()]);
  }
}
