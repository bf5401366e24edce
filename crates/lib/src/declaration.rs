//! Declaration records handed to the generator.
//!
//! A discovery front end turns developer annotations into these records; the
//! generator only sees the deserialized form. Stage lists left empty mean
//! "every stage of the build".

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_MEMORY, DEFAULT_QUEUE_BATCH_SIZE, DEFAULT_TIMEOUT};
use crate::diagnostic::SourceLocation;
use crate::resource::{FileStorageEventType, KeyType, WebsiteConfiguration};

/// No store declaration applies to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no key-value store declaration of {type_name} applies to stage {stage}")]
pub struct InvalidStage {
  pub type_name: String,
  pub stage: String,
}

#[derive(Debug, Error)]
pub enum DeclarationError {
  #[error("failed to read declarations {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse declarations: {0}")]
  Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Declarations {
  #[serde(default)]
  pub key_value_stores: Vec<KeyValueStoreDeclaration>,
  #[serde(default)]
  pub file_buckets: Vec<FileBucketDeclaration>,
  #[serde(default)]
  pub functions: Vec<FunctionDeclaration>,
}

impl Declarations {
  pub fn from_json(content: &str) -> Result<Self, DeclarationError> {
    Ok(serde_json::from_str(content)?)
  }

  pub fn load(path: &Path) -> Result<Self, DeclarationError> {
    let content = fs::read_to_string(path).map_err(|source| DeclarationError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_json(&content)
  }

  /// Store declarations for one data type, in declaration order.
  pub fn stores_of<'a, 'n>(
    &'a self,
    type_name: &'n str,
  ) -> impl Iterator<Item = &'a KeyValueStoreDeclaration> + use<'a, 'n> {
    self.key_value_stores.iter().filter(move |s| s.type_name == type_name)
  }

  /// Pick the store declaration of `type_name` that applies to `stage`.
  ///
  /// A declaration naming the stage wins over one with no stages; when neither
  /// exists the stage is invalid for this store.
  pub fn resolve_store(&self, type_name: &str, stage: &str) -> Result<&KeyValueStoreDeclaration, InvalidStage> {
    let mut fallback = None;
    for store in self.stores_of(type_name) {
      if store.stages.contains(stage) {
        return Ok(store);
      }
      if store.stages.is_empty() && fallback.is_none() {
        fallback = Some(store);
      }
    }
    fallback.ok_or_else(|| InvalidStage {
      type_name: type_name.to_string(),
      stage: stage.to_string(),
    })
  }
}

fn default_capacity() -> u32 {
  5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueStoreDeclaration {
  /// Simple name of the stored data type.
  pub type_name: String,
  /// Explicit table name. Empty means the type name.
  #[serde(default)]
  pub table_name: Option<String>,
  pub key_name: String,
  #[serde(default)]
  pub key_type: KeyType,
  #[serde(default)]
  pub stages: BTreeSet<String>,
  #[serde(default = "default_capacity")]
  pub read_capacity: u32,
  #[serde(default = "default_capacity")]
  pub write_capacity: u32,
  /// ARN of a table managed outside this project.
  #[serde(default)]
  pub existing_arn: Option<String>,
  #[serde(default)]
  pub location: Option<SourceLocation>,
}

impl KeyValueStoreDeclaration {
  /// Physical table name for a stage.
  pub fn table_name_for(&self, stage: &str) -> String {
    let base = match self.table_name.as_deref() {
      Some(name) if !name.is_empty() => name,
      _ => &self.type_name,
    };
    format!("{}{}", base, stage)
  }

  pub fn existing_arn(&self) -> Option<&str> {
    self.existing_arn.as_deref().filter(|arn| !arn.is_empty())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadDeclaration {
  pub local_file: String,
  pub target_file: String,
  #[serde(default)]
  pub substitute_variables: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBucketDeclaration {
  pub name: String,
  #[serde(default)]
  pub stages: BTreeSet<String>,
  #[serde(default)]
  pub website: Option<WebsiteConfiguration>,
  #[serde(default)]
  pub uploads: Vec<FileUploadDeclaration>,
  #[serde(default)]
  pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerCoordinates {
  pub class_name: String,
  #[serde(default)]
  pub package: String,
  pub method_name: String,
}

impl HandlerCoordinates {
  pub fn qualified_class_name(&self) -> String {
    if self.package.is_empty() {
      self.class_name.clone()
    } else {
      format!("{}.{}", self.package, self.class_name)
    }
  }
}

fn default_timeout() -> u32 {
  DEFAULT_TIMEOUT
}

fn default_memory() -> u32 {
  DEFAULT_MEMORY
}

fn default_batch_size() -> u32 {
  DEFAULT_QUEUE_BATCH_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
  pub handler: HandlerCoordinates,
  #[serde(default)]
  pub stages: BTreeSet<String>,
  #[serde(default = "default_timeout")]
  pub timeout: u32,
  #[serde(default = "default_memory")]
  pub memory: u32,
  pub trigger: TriggerDeclaration,
  #[serde(default)]
  pub uses: Vec<UsageDeclaration>,
  #[serde(default)]
  pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerDeclaration {
  Http {
    method: String,
    path: String,
    #[serde(default)]
    allowed_cors_origin: Option<String>,
  },
  Notification {
    topic: String,
  },
  Queue {
    id: String,
    #[serde(default = "default_batch_size")]
    batch_size: u32,
  },
  Store {
    /// Data type name of the key-value store whose stream is consumed.
    store: String,
  },
  Cron {
    expression: String,
  },
  File {
    bucket: String,
    event_type: FileStorageEventType,
  },
  #[serde(rename = "websocket")]
  WebSocket {
    route_key: String,
  },
  Basic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageDeclaration {
  BasicFunction {
    target: HandlerCoordinates,
    #[serde(default)]
    stages: BTreeSet<String>,
  },
  NotificationTopic {
    topic: String,
    #[serde(default)]
    stages: BTreeSet<String>,
  },
  Queue {
    id: String,
    #[serde(default)]
    stages: BTreeSet<String>,
  },
  KeyValueStore {
    store: String,
    #[serde(default)]
    stages: BTreeSet<String>,
  },
}

impl UsageDeclaration {
  pub fn stages(&self) -> &BTreeSet<String> {
    match self {
      UsageDeclaration::BasicFunction { stages, .. }
      | UsageDeclaration::NotificationTopic { stages, .. }
      | UsageDeclaration::Queue { stages, .. }
      | UsageDeclaration::KeyValueStore { stages, .. } => stages,
    }
  }
}
