pub const APP_NAME: &str = "nimbus";

/// Length of the truncated template hash reported for each rendered stage.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Stage used by runtime clients when `FUNCTION_STAGE` is absent.
pub const DEFAULT_STAGE: &str = "dev";

pub const DEFAULT_TIMEOUT: u32 = 10;
pub const DEFAULT_MEMORY: u32 = 1024;
pub const DEFAULT_RUNTIME: &str = "provided.al2023";
pub const DEFAULT_QUEUE_BATCH_SIZE: u32 = 10;

/// Queue visibility timeout is this multiple of the consuming function's timeout.
pub const QUEUE_VISIBILITY_MULTIPLIER: u32 = 6;

/// Stream event mappings always process one record at a time.
pub const STREAM_BATCH_SIZE: u32 = 1;

pub const STREAM_VIEW_TYPE: &str = "NEW_AND_OLD_IMAGES";

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

pub const STATE_FILENAME: &str = "nimbus-state.json";
pub const CONFIG_FILENAME: &str = "nimbus.yml";
pub const DECLARATIONS_FILENAME: &str = "nimbus-declarations.json";

/// Default directory, relative to the project, for templates and state.
pub const OUTPUT_DIR: &str = ".nimbus";

pub mod env {
  pub const NIMBUS_STAGE: &str = "NIMBUS_STAGE";
  pub const NIMBUS_PROJECT_NAME: &str = "NIMBUS_PROJECT_NAME";
  pub const FUNCTION_STAGE: &str = "FUNCTION_STAGE";
  pub const NIMBUS_ALLOWED_CORS_ORIGIN: &str = "NIMBUS_ALLOWED_CORS_ORIGIN";

  /// Topic ARN variable for a topic, e.g. `SNS_TOPIC_ARN_ORDERS`.
  pub fn topic_arn(topic: &str) -> String {
    format!("SNS_TOPIC_ARN_{}", topic.to_uppercase())
  }

  /// Queue URL variable for a queue id, e.g. `NIMBUS_QUEUE_URL_ID_JOBS`.
  pub fn queue_url(id: &str) -> String {
    format!("NIMBUS_QUEUE_URL_ID_{}", id.to_uppercase())
  }
}

pub mod exports {
  pub const REST_API_URL: &str = "${NIMBUS_REST_API_URL}";
  pub const WEBSOCKET_API_URL: &str = "${NIMBUS_WEBSOCKET_API_URL}";
}
