//! Template value expressions.
//!
//! Resources reference each other through a small expression language that
//! renders to CloudFormation intrinsic functions. Values are built while the
//! graph is synthesized and only turned into JSON when a template is rendered.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
  /// A plain string.
  Literal(String),
  /// `{"Ref": name}`: the resource's primary identifier or a pseudo parameter.
  Ref(String),
  /// `{"Fn::GetAtt": [resource, attribute]}`.
  GetAtt { resource: String, attribute: String },
  /// `{"Fn::Join": ["", parts]}`.
  Join(Vec<TemplateValue>),
}

impl TemplateValue {
  pub fn literal(value: impl Into<String>) -> Self {
    TemplateValue::Literal(value.into())
  }

  pub fn reference(name: impl Into<String>) -> Self {
    TemplateValue::Ref(name.into())
  }

  pub fn get_att(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
    TemplateValue::GetAtt {
      resource: resource.into(),
      attribute: attribute.into(),
    }
  }

  pub fn region() -> Self {
    TemplateValue::Ref("AWS::Region".to_string())
  }

  pub fn account_id() -> Self {
    TemplateValue::Ref("AWS::AccountId".to_string())
  }

  /// Append a literal suffix. An empty suffix leaves the value untouched.
  pub fn with_suffix(self, suffix: &str) -> Self {
    if suffix.is_empty() {
      return self;
    }
    match self {
      TemplateValue::Literal(s) => TemplateValue::Literal(format!("{}{}", s, suffix)),
      TemplateValue::Join(mut parts) => {
        parts.push(TemplateValue::literal(suffix));
        TemplateValue::Join(parts)
      }
      other => TemplateValue::Join(vec![other, TemplateValue::literal(suffix)]),
    }
  }

  /// Logical names this value refers to. Pseudo parameters are skipped.
  pub fn referenced_resources(&self) -> Vec<&str> {
    match self {
      TemplateValue::Literal(_) => Vec::new(),
      TemplateValue::Ref(name) if name.starts_with("AWS::") => Vec::new(),
      TemplateValue::Ref(name) => vec![name.as_str()],
      TemplateValue::GetAtt { resource, .. } => vec![resource.as_str()],
      TemplateValue::Join(parts) => parts.iter().flat_map(|p| p.referenced_resources()).collect(),
    }
  }

  pub fn to_json(&self) -> Value {
    match self {
      TemplateValue::Literal(s) => Value::String(s.clone()),
      TemplateValue::Ref(name) => json!({ "Ref": name }),
      TemplateValue::GetAtt { resource, attribute } => json!({ "Fn::GetAtt": [resource, attribute] }),
      TemplateValue::Join(parts) => {
        let rendered: Vec<Value> = parts.iter().map(TemplateValue::to_json).collect();
        json!({ "Fn::Join": ["", rendered] })
      }
    }
  }
}

impl From<&str> for TemplateValue {
  fn from(value: &str) -> Self {
    TemplateValue::literal(value)
  }
}

impl From<String> for TemplateValue {
  fn from(value: String) -> Self {
    TemplateValue::Literal(value)
  }
}

impl Serialize for TemplateValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.to_json().serialize(serializer)
  }
}
