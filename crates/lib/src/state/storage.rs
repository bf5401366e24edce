//! Reading and writing the build state file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{NimbusState, StateError};
use crate::consts::STATE_FILENAME;

/// Stores [`NimbusState`] as pretty JSON inside a build directory.
#[derive(Debug, Clone)]
pub struct StateStore {
  base_path: PathBuf,
}

impl StateStore {
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  pub fn state_path(&self) -> PathBuf {
    self.base_path.join(STATE_FILENAME)
  }

  fn ensure_dir(&self) -> Result<(), StateError> {
    fs::create_dir_all(&self.base_path).map_err(StateError::CreateDir)
  }

  /// Write the state, replacing any previous one.
  ///
  /// Writes to a temp file first and renames it over the target.
  pub fn save(&self, state: &NimbusState) -> Result<(), StateError> {
    self.ensure_dir()?;

    let path = self.state_path();
    let temp_path = self.base_path.join(format!("{}.tmp", STATE_FILENAME));

    let content = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;
    fs::write(&temp_path, &content).map_err(StateError::Write)?;
    fs::rename(&temp_path, &path).map_err(StateError::Write)?;

    debug!(path = %path.display(), handlers = state.handler_files.len(), "saved build state");
    Ok(())
  }

  pub fn load(&self) -> Result<NimbusState, StateError> {
    let path = self.state_path();
    let content = fs::read_to_string(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        StateError::NotFound(path.display().to_string())
      } else {
        StateError::Read(e)
      }
    })?;
    serde_json::from_str(&content).map_err(StateError::Parse)
  }

  /// Like [`load`](Self::load) but `Ok(None)` when no state was written yet.
  pub fn load_if_exists(&self) -> Result<Option<NimbusState>, StateError> {
    match self.load() {
      Ok(state) => Ok(Some(state)),
      Err(StateError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }
}
