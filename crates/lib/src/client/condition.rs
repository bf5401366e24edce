//! Conditions guarding store writes.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Equal,
  NotEqual,
  Less,
  LessOrEqual,
  Greater,
  GreaterOrEqual,
}

impl Comparison {
  fn symbol(self) -> &'static str {
    match self {
      Comparison::Equal => "=",
      Comparison::NotEqual => "<>",
      Comparison::Less => "<",
      Comparison::LessOrEqual => "<=",
      Comparison::Greater => ">",
      Comparison::GreaterOrEqual => ">=",
    }
  }

  fn holds(self, ordering: Option<Ordering>) -> bool {
    match (self, ordering) {
      (Comparison::NotEqual, None) => true,
      (_, None) => false,
      (Comparison::Equal, Some(o)) => o == Ordering::Equal,
      (Comparison::NotEqual, Some(o)) => o != Ordering::Equal,
      (Comparison::Less, Some(o)) => o == Ordering::Less,
      (Comparison::LessOrEqual, Some(o)) => o != Ordering::Greater,
      (Comparison::Greater, Some(o)) => o == Ordering::Greater,
      (Comparison::GreaterOrEqual, Some(o)) => o != Ordering::Less,
    }
  }
}

/// One side of a comparison: a column of the stored item or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  Column(String),
  Literal(Value),
}

impl Operand {
  pub fn column(name: impl Into<String>) -> Self {
    Operand::Column(name.into())
  }

  pub fn literal(value: impl Into<Value>) -> Self {
    Operand::Literal(value.into())
  }

  fn resolve<'a>(&'a self, item: Option<&'a Map<String, Value>>) -> Option<&'a Value> {
    match self {
      Operand::Column(name) => item.and_then(|item| item.get(name)),
      Operand::Literal(value) => Some(value),
    }
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Column(name) => write!(f, "{}", name),
      Operand::Literal(value) => write!(f, "{}", value),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
  Compare {
    left: Operand,
    comparison: Comparison,
    right: Operand,
  },
  Exists(String),
  NotExists(String),
  And(Box<Condition>, Box<Condition>),
  Or(Box<Condition>, Box<Condition>),
  Not(Box<Condition>),
}

impl Condition {
  pub fn compare(left: Operand, comparison: Comparison, right: Operand) -> Self {
    Condition::Compare {
      left,
      comparison,
      right,
    }
  }

  /// `column <comparison> literal`, the common case.
  pub fn column(name: &str, comparison: Comparison, value: impl Into<Value>) -> Self {
    Self::compare(Operand::column(name), comparison, Operand::literal(value))
  }

  pub fn exists(column: impl Into<String>) -> Self {
    Condition::Exists(column.into())
  }

  pub fn not_exists(column: impl Into<String>) -> Self {
    Condition::NotExists(column.into())
  }

  pub fn and(self, other: Condition) -> Self {
    Condition::And(Box::new(self), Box::new(other))
  }

  pub fn or(self, other: Condition) -> Self {
    Condition::Or(Box::new(self), Box::new(other))
  }

  pub fn negate(self) -> Self {
    Condition::Not(Box::new(self))
  }

  /// Evaluate against the currently stored item, `None` when absent.
  ///
  /// Comparisons touching a missing column are false, except `<>`.
  pub fn evaluate(&self, item: Option<&Map<String, Value>>) -> bool {
    match self {
      Condition::Compare {
        left,
        comparison,
        right,
      } => {
        let ordering = match (left.resolve(item), right.resolve(item)) {
          (Some(l), Some(r)) => compare_values(l, r),
          _ => None,
        };
        comparison.holds(ordering)
      }
      Condition::Exists(column) => item.is_some_and(|item| item.contains_key(column)),
      Condition::NotExists(column) => !item.is_some_and(|item| item.contains_key(column)),
      Condition::And(a, b) => a.evaluate(item) && b.evaluate(item),
      Condition::Or(a, b) => a.evaluate(item) || b.evaluate(item),
      Condition::Not(inner) => !inner.evaluate(item),
    }
  }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
  match (left, right) {
    (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
      (Some(l), Some(r)) => Some(l.cmp(&r)),
      _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
    },
    (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
    (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
    (Value::Null, Value::Null) => Some(Ordering::Equal),
    (l, r) if l == r => Some(Ordering::Equal),
    _ => None,
  }
}

impl fmt::Display for Condition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Condition::Compare {
        left,
        comparison,
        right,
      } => write!(f, "{} {} {}", left, comparison.symbol(), right),
      Condition::Exists(column) => write!(f, "attribute_exists({})", column),
      Condition::NotExists(column) => write!(f, "attribute_not_exists({})", column),
      Condition::And(a, b) => write!(f, "({} AND {})", a, b),
      Condition::Or(a, b) => write!(f, "({} OR {})", a, b),
      Condition::Not(inner) => write!(f, "NOT {}", inner),
    }
  }
}
