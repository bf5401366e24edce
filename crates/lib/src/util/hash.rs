//! Content hashes of rendered templates.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

/// Truncated SHA-256 of a value's compact JSON form. Two stages rendering the
/// same resources share a hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl ObjectHash {
  pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
    let digest = Sha256::digest(serde_json::to_vec(value)?);
    let mut hex: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
    hex.truncate(OBJ_HASH_PREFIX_LEN);
    Ok(ObjectHash(hex))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
