//! Logical and physical name derivation.
//!
//! Logical names identify a resource inside one template and must be stable
//! across runs, so they are built only from the semantic identity of the
//! resource (class, method, topic, path...) and its stage.

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Join name parts into an alphanumeric logical id.
///
/// Every part is capitalized and stripped of non-alphanumeric characters, so
/// `["items", "$connect", "dev"]` becomes `ItemsConnectDev`.
pub fn logical_id(parts: &[&str]) -> String {
  parts
    .iter()
    .map(|part| {
      let cleaned: String = part.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
      capitalize(&cleaned)
    })
    .collect()
}

/// Logical id for one HTTP path segment. Path variables (`{id}`) are kept
/// distinct from literal segments with the same text.
pub fn path_segment_id(segment: &str) -> String {
  match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
    Some(variable) => logical_id(&[variable, "Var"]),
    None => logical_id(&[segment]),
  }
}

/// Readable key of an HTTP path. Different paths may share one (`Items` and
/// `items`), so callers register it per stage to make it unique.
pub fn path_key(segments: &[&str]) -> String {
  segments.iter().map(|s| path_segment_id(s)).collect()
}

/// Physical name of a deployed function. Shared between synthesis and the
/// runtime invocation client so both sides agree on the target name.
pub fn function_name(project: &str, class_name: &str, method_name: &str, stage: &str) -> String {
  format!("{}-{}-{}-{}", project, stage, class_name, method_name)
}

/// Lower-cased physical bucket name with characters S3 rejects removed.
pub fn bucket_name(parts: &[&str]) -> String {
  parts
    .iter()
    .map(|part| {
      part
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_lowercase()
    })
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}

/// Digits of a timestamp, used to force a fresh deployment resource per build.
pub fn timestamp_suffix(timestamp: &str) -> String {
  timestamp.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn logical_id_strips_and_capitalizes() {
    assert_eq!(logical_id(&["items", "$connect", "dev"]), "ItemsConnectDev");
    assert_eq!(logical_id(&["ItemsHandler", "getItems", "Function", "prod-eu"]), "ItemsHandlerGetItemsFunctionProdeu");
  }

  #[test]
  fn path_variables_differ_from_literals() {
    assert_ne!(path_segment_id("{id}"), path_segment_id("id"));
    assert_eq!(path_segment_id("{id}"), "IdVar");
  }

  #[test]
  fn path_key_concatenates_segments() {
    assert_eq!(path_key(&["items", "{id}"]), "ItemsIdVar");
    assert_eq!(path_key(&[]), "");
  }

  #[test]
  fn bucket_name_is_lowercase() {
    assert_eq!(bucket_name(&["nimbus", "My_Project", "dev"]), "nimbus-myproject-dev");
  }

  #[test]
  fn timestamp_suffix_keeps_digits() {
    assert_eq!(timestamp_suffix("2024-05-01T10:20:30Z"), "20240501102030");
  }

  #[test]
  fn function_name_layout() {
    assert_eq!(function_name("shop", "ItemsHandler", "getItems", "dev"), "shop-dev-ItemsHandler-getItems");
  }
}
