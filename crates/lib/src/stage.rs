//! Stage resolution.
//!
//! Declarations either name the stages they apply to or leave the list empty,
//! meaning "every stage of this build".

use std::collections::BTreeSet;

use crate::config::ProjectConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResolver {
  known: BTreeSet<String>,
}

impl StageResolver {
  pub fn new<I, S>(known: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      known: known.into_iter().map(Into::into).collect(),
    }
  }

  pub fn from_config(config: &ProjectConfig) -> Self {
    Self {
      known: config.stages.clone(),
    }
  }

  pub fn known_stages(&self) -> &BTreeSet<String> {
    &self.known
  }

  /// Expand a declared stage set.
  ///
  /// Empty means all known stages. A non-empty set is returned verbatim;
  /// names are not checked against the known stages here.
  pub fn determine_stages(&self, declared: &BTreeSet<String>) -> BTreeSet<String> {
    if declared.is_empty() {
      self.known.clone()
    } else {
      declared.clone()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn empty_declaration_expands_to_all_stages() {
    let resolver = StageResolver::new(["dev", "prod", "staging"]);
    assert_eq!(resolver.determine_stages(&BTreeSet::new()), set(&["dev", "prod", "staging"]));
  }

  #[test]
  fn explicit_stages_are_returned_verbatim() {
    let resolver = StageResolver::new(["dev", "prod"]);
    assert_eq!(resolver.determine_stages(&set(&["prod"])), set(&["prod"]));
  }

  #[test]
  fn unknown_stages_are_not_filtered() {
    let resolver = StageResolver::new(["dev"]);
    assert_eq!(resolver.determine_stages(&set(&["qa"])), set(&["qa"]));
  }

  #[test]
  fn resolver_from_config() {
    let config = ProjectConfig::new("shop").with_stages(["dev", "prod"]);
    let resolver = StageResolver::from_config(&config);
    assert_eq!(resolver.known_stages(), &set(&["dev", "prod"]));
  }
}
