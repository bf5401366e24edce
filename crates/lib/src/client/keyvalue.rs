//! Typed access to a key-value store table.
//!
//! Every write is first expressed as a [`WriteItemRequest`]. The direct
//! methods on [`KeyValueClient`] execute one request; the builders hand the
//! request back so several can be committed together through a
//! [`TransactionClient`].

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::condition::Condition;
use super::error::ClientError;
use crate::declaration::KeyValueStoreDeclaration;

/// A stored item: attribute name to value.
pub type Item = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
  Plus,
  Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
  Put(Item),
  Delete,
  /// Add `amount` with `sign` to a numeric field of an existing item.
  ApplyDelta { field: String, amount: Number, sign: Sign },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteItemRequest {
  pub table: String,
  pub key: Item,
  pub operation: WriteOperation,
  pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadItemRequest {
  pub table: String,
  pub key: Item,
}

pub trait KeyValueBackend: Send + Sync {
  fn get_item(&self, request: &ReadItemRequest) -> Result<Option<Item>, ClientError>;

  fn scan(&self, table: &str) -> Result<Vec<Item>, ClientError>;

  fn write_item(&self, request: WriteItemRequest) -> Result<(), ClientError>;

  /// Apply every request or none of them.
  fn transact_write(&self, requests: Vec<WriteItemRequest>) -> Result<(), ClientError>;

  fn transact_read(&self, requests: &[ReadItemRequest]) -> Result<Vec<Option<Item>>, ClientError>;
}

/// `current + amount` or `current - amount`. Integers stay integers unless
/// either side is fractional.
pub fn apply_delta(current: &Number, amount: &Number, sign: Sign) -> Option<Number> {
  if let (Some(current), Some(amount)) = (current.as_i64(), amount.as_i64()) {
    let result = match sign {
      Sign::Plus => current.checked_add(amount)?,
      Sign::Minus => current.checked_sub(amount)?,
    };
    return Some(Number::from(result));
  }
  let (current, amount) = (current.as_f64()?, amount.as_f64()?);
  let result = match sign {
    Sign::Plus => current + amount,
    Sign::Minus => current - amount,
  };
  Number::from_f64(result)
}

pub struct KeyValueClient<K, V> {
  table: String,
  key_name: String,
  backend: Arc<dyn KeyValueBackend>,
  _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> KeyValueClient<K, V>
where
  K: Serialize + DeserializeOwned + Eq + Hash,
  V: Serialize + DeserializeOwned,
{
  pub fn new(table: impl Into<String>, key_name: impl Into<String>, backend: Arc<dyn KeyValueBackend>) -> Self {
    Self {
      table: table.into(),
      key_name: key_name.into(),
      backend,
      _types: PhantomData,
    }
  }

  /// Client for a declared store in `stage`. Stores bound to an existing
  /// table use the table named in its ARN.
  pub fn for_store(declaration: &KeyValueStoreDeclaration, stage: &str, backend: Arc<dyn KeyValueBackend>) -> Self {
    let table = declaration
      .existing_arn()
      .and_then(|arn| arn.rsplit_once("table/").map(|(_, name)| name.to_string()))
      .unwrap_or_else(|| declaration.table_name_for(stage));
    Self::new(table, declaration.key_name.clone(), backend)
  }

  pub fn table(&self) -> &str {
    &self.table
  }

  pub fn key_name(&self) -> &str {
    &self.key_name
  }

  // Keys enter and leave the store only through the two functions below.

  fn encode_key(&self, key: &K) -> Result<Item, ClientError> {
    let mut item = Map::new();
    item.insert(self.key_name.clone(), serde_json::to_value(key)?);
    Ok(item)
  }

  fn decode_key(&self, item: &Item) -> Result<K, ClientError> {
    let raw = item.get(&self.key_name).ok_or_else(|| ClientError::MissingKey {
      table: self.table.clone(),
      key_name: self.key_name.clone(),
    })?;
    Ok(serde_json::from_value(raw.clone())?)
  }

  fn encode_item(&self, key: &K, value: &V) -> Result<Item, ClientError> {
    let Value::Object(mut item) = serde_json::to_value(value)? else {
      return Err(ClientError::NotAnObject);
    };
    item.extend(self.encode_key(key)?);
    Ok(item)
  }

  /// Decode a stored item, e.g. one returned by a transactional read.
  pub fn decode(&self, item: Item) -> Result<V, ClientError> {
    Ok(serde_json::from_value(Value::Object(item))?)
  }

  pub fn write_item_request(
    &self,
    key: &K,
    value: &V,
    condition: Option<Condition>,
  ) -> Result<WriteItemRequest, ClientError> {
    Ok(WriteItemRequest {
      table: self.table.clone(),
      key: self.encode_key(key)?,
      operation: WriteOperation::Put(self.encode_item(key, value)?),
      condition,
    })
  }

  pub fn delete_item_request(&self, key: &K, condition: Option<Condition>) -> Result<WriteItemRequest, ClientError> {
    Ok(WriteItemRequest {
      table: self.table.clone(),
      key: self.encode_key(key)?,
      operation: WriteOperation::Delete,
      condition,
    })
  }

  fn delta_request(
    &self,
    key: &K,
    field: &str,
    amount: Number,
    sign: Sign,
    condition: Option<Condition>,
  ) -> Result<WriteItemRequest, ClientError> {
    Ok(WriteItemRequest {
      table: self.table.clone(),
      key: self.encode_key(key)?,
      operation: WriteOperation::ApplyDelta {
        field: field.to_string(),
        amount,
        sign,
      },
      condition,
    })
  }

  pub fn increment_request(
    &self,
    key: &K,
    field: &str,
    amount: impl Into<Number>,
    condition: Option<Condition>,
  ) -> Result<WriteItemRequest, ClientError> {
    self.delta_request(key, field, amount.into(), Sign::Plus, condition)
  }

  pub fn decrement_request(
    &self,
    key: &K,
    field: &str,
    amount: impl Into<Number>,
    condition: Option<Condition>,
  ) -> Result<WriteItemRequest, ClientError> {
    self.delta_request(key, field, amount.into(), Sign::Minus, condition)
  }

  pub fn read_item_request(&self, key: &K) -> Result<ReadItemRequest, ClientError> {
    Ok(ReadItemRequest {
      table: self.table.clone(),
      key: self.encode_key(key)?,
    })
  }

  fn execute(&self, request: WriteItemRequest) -> Result<(), ClientError> {
    debug!(table = %self.table, operation = ?request.operation, "writing item");
    self.backend.write_item(request)
  }

  pub fn put(&self, key: &K, value: &V) -> Result<(), ClientError> {
    self.execute(self.write_item_request(key, value, None)?)
  }

  pub fn put_if(&self, key: &K, value: &V, condition: Condition) -> Result<(), ClientError> {
    self.execute(self.write_item_request(key, value, Some(condition))?)
  }

  pub fn delete(&self, key: &K) -> Result<(), ClientError> {
    self.execute(self.delete_item_request(key, None)?)
  }

  pub fn delete_if(&self, key: &K, condition: Condition) -> Result<(), ClientError> {
    self.execute(self.delete_item_request(key, Some(condition))?)
  }

  pub fn increment(
    &self,
    key: &K,
    field: &str,
    amount: impl Into<Number>,
    condition: Option<Condition>,
  ) -> Result<(), ClientError> {
    self.execute(self.increment_request(key, field, amount, condition)?)
  }

  pub fn decrement(
    &self,
    key: &K,
    field: &str,
    amount: impl Into<Number>,
    condition: Option<Condition>,
  ) -> Result<(), ClientError> {
    self.execute(self.decrement_request(key, field, amount, condition)?)
  }

  pub fn get(&self, key: &K) -> Result<Option<V>, ClientError> {
    match self.backend.get_item(&self.read_item_request(key)?)? {
      Some(item) => self.decode(item).map(Some),
      None => Ok(None),
    }
  }

  pub fn get_all(&self) -> Result<HashMap<K, V>, ClientError> {
    let mut all = HashMap::new();
    for item in self.backend.scan(&self.table)? {
      let key = self.decode_key(&item)?;
      all.insert(key, self.decode(item)?);
    }
    Ok(all)
  }
}

/// Commits requests built by one or more [`KeyValueClient`]s atomically.
pub struct TransactionClient {
  backend: Arc<dyn KeyValueBackend>,
}

impl TransactionClient {
  pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
    Self { backend }
  }

  pub fn execute_write(&self, requests: Vec<WriteItemRequest>) -> Result<(), ClientError> {
    debug!(requests = requests.len(), "committing write transaction");
    self.backend.transact_write(requests)
  }

  pub fn execute_read(&self, requests: &[ReadItemRequest]) -> Result<Vec<Option<Item>>, ClientError> {
    self.backend.transact_read(requests)
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  use super::*;
  use crate::client::condition::Comparison;
  use crate::client::local::LocalKeyValueBackend;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Account {
    owner: String,
    balance: i64,
  }

  fn client(backend: &Arc<LocalKeyValueBackend>) -> KeyValueClient<u32, Account> {
    KeyValueClient::new("Accountsdev", "id", backend.clone())
  }

  fn account(owner: &str, balance: i64) -> Account {
    Account {
      owner: owner.to_string(),
      balance,
    }
  }

  mod writes {
    use super::*;

    #[test]
    fn put_then_get() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 10)).unwrap();

      assert_eq!(accounts.get(&1).unwrap(), Some(account("ann", 10)));
      assert_eq!(accounts.get(&2).unwrap(), None);
    }

    #[test]
    fn stored_item_carries_key_field() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      let request = accounts.write_item_request(&7, &account("bo", 1), None).unwrap();
      let WriteOperation::Put(item) = &request.operation else {
        panic!("expected put");
      };
      assert_eq!(item["id"], 7);
      assert_eq!(request.key["id"], 7);
    }

    #[test]
    fn put_if_respects_condition() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put_if(&1, &account("ann", 10), Condition::not_exists("id")).unwrap();

      let err = accounts
        .put_if(&1, &account("eve", 0), Condition::not_exists("id"))
        .unwrap_err();
      assert!(matches!(err, ClientError::ConditionFailed { .. }));
      assert_eq!(accounts.get(&1).unwrap().unwrap().owner, "ann");
    }

    #[test]
    fn delete_and_delete_if() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 10)).unwrap();
      accounts.put(&2, &account("bo", 0)).unwrap();

      accounts.delete(&1).unwrap();
      assert_eq!(accounts.get(&1).unwrap(), None);

      let positive = Condition::column("balance", Comparison::Greater, 0);
      assert!(accounts.delete_if(&2, positive).is_err());
      assert!(accounts.get(&2).unwrap().is_some());
    }

    #[test]
    fn non_object_value_is_rejected() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let numbers: KeyValueClient<u32, i64> = KeyValueClient::new("Numbers", "id", backend.clone());
      assert!(matches!(numbers.put(&1, &5), Err(ClientError::NotAnObject)));
    }
  }

  mod arithmetic {
    use super::*;

    #[test]
    fn increment_and_decrement() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 10)).unwrap();

      accounts.increment(&1, "balance", 5, None).unwrap();
      accounts.decrement(&1, "balance", 3, None).unwrap();
      assert_eq!(accounts.get(&1).unwrap().unwrap().balance, 12);
    }

    #[test]
    fn guarded_decrement() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 2)).unwrap();

      let covered = Condition::column("balance", Comparison::GreaterOrEqual, 5);
      assert!(accounts.decrement(&1, "balance", 5, Some(covered)).is_err());
      assert_eq!(accounts.get(&1).unwrap().unwrap().balance, 2);
    }

    #[test]
    fn non_numeric_field_fails() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 2)).unwrap();
      assert!(matches!(
        accounts.increment(&1, "owner", 1, None),
        Err(ClientError::NotNumeric { .. })
      ));
    }

    #[test]
    fn delta_keeps_integers() {
      assert_eq!(apply_delta(&Number::from(2), &Number::from(3), Sign::Minus), Some(Number::from(-1)));
      let fractional = apply_delta(&Number::from(1), &Number::from_f64(0.5).unwrap(), Sign::Plus).unwrap();
      assert_eq!(fractional.as_f64(), Some(1.5));
      assert_eq!(apply_delta(&Number::from(i64::MAX), &Number::from(1), Sign::Plus), None);
    }
  }

  mod reads {
    use super::*;

    #[test]
    fn get_all_decodes_keys() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 1)).unwrap();
      accounts.put(&2, &account("bo", 2)).unwrap();

      let all = accounts.get_all().unwrap();
      assert_eq!(all.len(), 2);
      assert_eq!(all[&2u32].owner, "bo");
    }

    #[test]
    fn for_store_uses_stage_table_or_external_arn() {
      let backend: Arc<dyn KeyValueBackend> = Arc::new(LocalKeyValueBackend::new());
      let mut declaration: KeyValueStoreDeclaration =
        serde_json::from_value(serde_json::json!({ "type_name": "Account", "key_name": "id" })).unwrap();
      let staged: KeyValueClient<u32, Account> = KeyValueClient::for_store(&declaration, "dev", backend.clone());
      assert_eq!(staged.table(), "Accountdev");

      declaration.existing_arn = Some("arn:aws:dynamodb:eu-west-1:1:table/legacy-accounts".to_string());
      let external: KeyValueClient<u32, Account> = KeyValueClient::for_store(&declaration, "dev", backend);
      assert_eq!(external.table(), "legacy-accounts");
    }
  }

  mod transactions {
    use super::*;

    #[test]
    fn transfer_commits_both_sides() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 10)).unwrap();
      accounts.put(&2, &account("bo", 0)).unwrap();

      let transactions = TransactionClient::new(backend.clone());
      transactions
        .execute_write(vec![
          accounts.decrement_request(&1, "balance", 4, None).unwrap(),
          accounts.increment_request(&2, "balance", 4, None).unwrap(),
        ])
        .unwrap();

      assert_eq!(accounts.get(&1).unwrap().unwrap().balance, 6);
      assert_eq!(accounts.get(&2).unwrap().unwrap().balance, 4);
    }

    #[test]
    fn failed_condition_rolls_back_everything() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 3)).unwrap();
      accounts.put(&2, &account("bo", 0)).unwrap();

      let covered = Condition::column("balance", Comparison::GreaterOrEqual, 4);
      let result = TransactionClient::new(backend.clone()).execute_write(vec![
        accounts.increment_request(&2, "balance", 4, None).unwrap(),
        accounts.decrement_request(&1, "balance", 4, Some(covered)).unwrap(),
      ]);

      assert!(result.is_err());
      assert_eq!(accounts.get(&1).unwrap().unwrap().balance, 3);
      assert_eq!(accounts.get(&2).unwrap().unwrap().balance, 0);
    }

    #[test]
    fn transactional_read() {
      let backend = Arc::new(LocalKeyValueBackend::new());
      let accounts = client(&backend);
      accounts.put(&1, &account("ann", 3)).unwrap();

      let items = TransactionClient::new(backend.clone())
        .execute_read(&[accounts.read_item_request(&1).unwrap(), accounts.read_item_request(&9).unwrap()])
        .unwrap();
      assert_eq!(items.len(), 2);
      let first = items[0].clone().map(|item| accounts.decode(item).unwrap());
      assert_eq!(first, Some(account("ann", 3)));
      assert!(items[1].is_none());
    }
  }
}
