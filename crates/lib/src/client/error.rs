use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("condition not satisfied for {table}: {condition}")]
  ConditionFailed { table: String, condition: String },

  #[error("field {field} of {table} item is not numeric")]
  NotNumeric { table: String, field: String },

  #[error("item in {table} has no key field {key_name}")]
  MissingKey { table: String, key_name: String },

  #[error("value does not serialize to an object")]
  NotAnObject,

  #[error("nothing registered for {0}")]
  UnknownTarget(String),

  #[error("unknown subscription {0}")]
  UnknownSubscription(String),

  #[error("function {function} failed: {message}")]
  FunctionFailed { function: String, message: String },

  #[error("serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("backend error: {0}")]
  Backend(String),
}
