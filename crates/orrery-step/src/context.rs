//! Shared state of one workflow run.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use orrery_config::ParameterValue;

use crate::error::ContextError;

/// Non-owning reference to a resource owned by a service.
///
/// The context never keeps a resource alive; once the owning service drops
/// it, [`ResourceHandle::upgrade`] returns `None`.
#[derive(Clone)]
pub struct ResourceHandle(Weak<dyn Any + Send + Sync>);

impl ResourceHandle {
  pub fn new<T: Any + Send + Sync>(resource: &Arc<T>) -> Self {
    let weak: Weak<T> = Arc::downgrade(resource);
    Self(weak)
  }

  /// Get the resource back as `T`, if it is still alive and of that type.
  pub fn upgrade<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.0.upgrade()?.downcast::<T>().ok()
  }

  pub fn is_alive(&self) -> bool {
    self.0.strong_count() > 0
  }
}

impl fmt::Debug for ResourceHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResourceHandle")
      .field("alive", &self.is_alive())
      .finish()
  }
}

impl PartialEq for ResourceHandle {
  fn eq(&self, other: &Self) -> bool {
    Weak::ptr_eq(&self.0, &other.0)
  }
}

/// A value stored in a [`WorkflowContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
  String(String),
  Number(f64),
  Bool(bool),
  Handle(ResourceHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
  String,
  Number,
  Bool,
  Handle,
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ValueKind::String => "string",
      ValueKind::Number => "number",
      ValueKind::Bool => "bool",
      ValueKind::Handle => "handle",
    };
    f.write_str(name)
  }
}

impl ContextValue {
  pub fn kind(&self) -> ValueKind {
    match self {
      ContextValue::String(_) => ValueKind::String,
      ContextValue::Number(_) => ValueKind::Number,
      ContextValue::Bool(_) => ValueKind::Bool,
      ContextValue::Handle(_) => ValueKind::Handle,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      ContextValue::String(value) => Some(value),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      ContextValue::Number(value) => Some(*value),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      ContextValue::Bool(value) => Some(*value),
      _ => None,
    }
  }

  /// Scalar parameter values map directly; lists have no context form.
  pub fn from_parameter(value: &ParameterValue) -> Option<Self> {
    match value {
      ParameterValue::String(value) => Some(ContextValue::String(value.clone())),
      ParameterValue::Number(value) => Some(ContextValue::Number(*value)),
      ParameterValue::Bool(value) => Some(ContextValue::Bool(*value)),
      ParameterValue::StringList(_) | ParameterValue::NumberList(_) => None,
    }
  }
}

impl From<&str> for ContextValue {
  fn from(value: &str) -> Self {
    ContextValue::String(value.to_string())
  }
}

impl From<String> for ContextValue {
  fn from(value: String) -> Self {
    ContextValue::String(value)
  }
}

impl From<f64> for ContextValue {
  fn from(value: f64) -> Self {
    ContextValue::Number(value)
  }
}

impl From<bool> for ContextValue {
  fn from(value: bool) -> Self {
    ContextValue::Bool(value)
  }
}

impl From<ResourceHandle> for ContextValue {
  fn from(value: ResourceHandle) -> Self {
    ContextValue::Handle(value)
  }
}

/// Typed key/value store shared by the steps of a run.
///
/// Written by variable seeding and by steps; a step sees every write made by
/// the steps before it.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
  values: HashMap<String, ContextValue>,
}

impl WorkflowContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
    self.values.insert(key.into(), value.into());
  }

  /// Store a non-owning handle to `resource`.
  pub fn set_handle<T: Any + Send + Sync>(&mut self, key: impl Into<String>, resource: &Arc<T>) {
    self.set(key, ResourceHandle::new(resource));
  }

  pub fn get(&self, key: &str) -> Option<&ContextValue> {
    self.values.get(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
    self.values.remove(key)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn clear(&mut self) {
    self.values.clear();
  }

  pub fn get_string(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(ContextValue::as_str)
  }

  pub fn get_number(&self, key: &str) -> Option<f64> {
    self.get(key).and_then(ContextValue::as_number)
  }

  pub fn get_bool(&self, key: &str) -> Option<bool> {
    self.get(key).and_then(ContextValue::as_bool)
  }

  pub fn get_string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
    self.get_string(key).unwrap_or(default)
  }

  pub fn get_number_or(&self, key: &str, default: f64) -> f64 {
    self.get_number(key).unwrap_or(default)
  }

  pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
    self.get_bool(key).unwrap_or(default)
  }

  pub fn require(&self, key: &str) -> Result<&ContextValue, ContextError> {
    self.get(key).ok_or_else(|| ContextError::Missing {
      key: key.to_string(),
    })
  }

  pub fn require_string(&self, key: &str) -> Result<&str, ContextError> {
    let value = self.require(key)?;
    value
      .as_str()
      .ok_or_else(|| mismatch(key, ValueKind::String, value))
  }

  pub fn require_number(&self, key: &str) -> Result<f64, ContextError> {
    let value = self.require(key)?;
    value
      .as_number()
      .ok_or_else(|| mismatch(key, ValueKind::Number, value))
  }

  pub fn require_bool(&self, key: &str) -> Result<bool, ContextError> {
    let value = self.require(key)?;
    value
      .as_bool()
      .ok_or_else(|| mismatch(key, ValueKind::Bool, value))
  }

  /// Upgrade the handle stored under `key`.
  ///
  /// `None` if the key is absent, holds another kind of value, or the
  /// resource has already been released by its owner.
  pub fn handle<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
    match self.get(key)? {
      ContextValue::Handle(handle) => handle.upgrade(),
      _ => None,
    }
  }
}

fn mismatch(key: &str, expected: ValueKind, actual: &ContextValue) -> ContextError {
  ContextError::TypeMismatch {
    key: key.to_string(),
    expected,
    actual: actual.kind(),
  }
}
