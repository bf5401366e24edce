//! Project configuration.
//!
//! A project is described by a `nimbus.yml` file next to the sources:
//!
//! ```yaml
//! project_name: shop
//! stages: [dev, prod]
//! cloud_provider: AWS
//! assemble: false
//! ```
//!
//! Every field except `project_name` has a default, so a one-line config is
//! valid.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::DEFAULT_STAGE;
use crate::state::CloudProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
  pub project_name: String,
  /// Every stage known to this build. Declarations with no explicit stages
  /// are replicated to all of them.
  #[serde(default = "default_stages")]
  pub stages: BTreeSet<String>,
  #[serde(default)]
  pub cloud_provider: CloudProvider,
  #[serde(default)]
  pub assemble: bool,
}

fn default_stages() -> BTreeSet<String> {
  BTreeSet::from([DEFAULT_STAGE.to_string()])
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_yaml::Error),

  #[error("config must declare at least one stage")]
  NoStages,

  #[error("project_name must not be empty")]
  EmptyProjectName,
}

impl ProjectConfig {
  pub fn new(project_name: &str) -> Self {
    Self {
      project_name: project_name.to_string(),
      stages: default_stages(),
      cloud_provider: CloudProvider::default(),
      assemble: false,
    }
  }

  pub fn with_stages<I, S>(mut self, stages: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.stages = stages.into_iter().map(Into::into).collect();
    self
  }

  pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
    let config: ProjectConfig = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    debug!(path = %path.display(), "loading project config");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_yaml(&content)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.project_name.trim().is_empty() {
      return Err(ConfigError::EmptyProjectName);
    }
    if self.stages.is_empty() {
      return Err(ConfigError::NoStages);
    }
    Ok(())
  }
}
