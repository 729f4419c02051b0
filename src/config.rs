//! Camera configuration
//!
//! A [`ConfigTree`] is an owned snapshot of the camera's configuration widgets.
//! Editing it never talks to the camera; changes become visible on the device
//! only once the whole tree is handed to [`Device::commit_config`](crate::device::Device::commit_config).
//!
//! ## Paths
//! Nodes are addressed by their names from the root down, separated by `/` or `.`.
//! A leading `/` and the name of the root window are optional, so
//! `/main/actions/viewfinder` and `actions.viewfinder` address the same node.
//!
//! ```
//! use focus_bracket::config::{ConfigNode, ConfigTree, ConfigValue};
//!
//! let mut tree = ConfigTree::new(ConfigNode::group(
//!   "main",
//!   vec![ConfigNode::group("actions", vec![ConfigNode::new("viewfinder", ConfigValue::Toggle(Some(false)))])],
//! ));
//!
//! tree.set("/main/actions/viewfinder", true)?;
//! assert_eq!(tree.get("actions.viewfinder")?.value(), &ConfigValue::Toggle(Some(true)));
//! # Ok::<(), focus_bracket::error::ConfigError>(())
//! ```

use crate::error::ConfigError;
use std::fmt;

/// Current value of a configuration node
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
  /// Window or section holding other nodes
  Group,
  /// Free text
  Text(String),
  /// Number inside a range
  Range {
    /// Current value
    value: f32,
    /// Lower bound
    min: f32,
    /// Upper bound
    max: f32,
    /// Increment
    step: f32,
  },
  /// On/off switch, `None` if the camera reports neither
  Toggle(Option<bool>),
  /// One out of a list of choices (radio or menu widget)
  Choice {
    /// Currently selected choice
    current: String,
    /// Available choices
    choices: Vec<String>,
  },
  /// Action without a value
  Button,
  /// UNIX timestamp
  Date(i32),
}

impl ConfigValue {
  fn kind_name(&self) -> &'static str {
    match self {
      Self::Group => "group",
      Self::Text(_) => "text",
      Self::Range { .. } => "range",
      Self::Toggle(_) => "toggle",
      Self::Choice { .. } => "choice",
      Self::Button => "button",
      Self::Date(_) => "date",
    }
  }
}

/// Value written into a node with [`ConfigTree::set`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  /// Integer, accepted by range, text, toggle and date nodes
  Integer(i64),
  /// String, accepted by choice and text nodes
  Text(String),
  /// Boolean, accepted by toggle nodes
  Toggle(bool),
}

impl Value {
  fn kind_name(&self) -> &'static str {
    match self {
      Self::Integer(_) => "an integer",
      Self::Text(_) => "a string",
      Self::Toggle(_) => "a boolean",
    }
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Self::Integer(value)
  }
}

impl From<i32> for Value {
  fn from(value: i32) -> Self {
    Self::Integer(value.into())
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Self::Text(value.to_owned())
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Self::Toggle(value)
  }
}

/// Single node of a [`ConfigTree`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
  name: String,
  label: String,
  readonly: bool,
  changed: bool,
  value: ConfigValue,
  children: Vec<ConfigNode>,
}

impl ConfigNode {
  /// Creates a leaf node
  pub fn new(name: impl Into<String>, value: ConfigValue) -> Self {
    let name = name.into();
    Self { label: name.clone(), name, readonly: false, changed: false, value, children: Vec::new() }
  }

  /// Creates a group node holding `children`
  pub fn group(name: impl Into<String>, children: Vec<ConfigNode>) -> Self {
    Self { children, ..Self::new(name, ConfigValue::Group) }
  }

  /// Sets the human readable label
  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = label.into();
    self
  }

  /// Marks the node as read only
  pub fn readonly(mut self, readonly: bool) -> Self {
    self.readonly = readonly;
    self
  }

  /// Name used in paths
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Human readable label
  pub fn label(&self) -> &str {
    &self.label
  }

  /// If true, the camera refuses writes to this node
  pub fn is_readonly(&self) -> bool {
    self.readonly
  }

  /// If true, the node was modified since the snapshot was taken
  pub fn is_changed(&self) -> bool {
    self.changed
  }

  /// Current value
  pub fn value(&self) -> &ConfigValue {
    &self.value
  }

  /// Child nodes, empty for leaves
  pub fn children(&self) -> &[ConfigNode] {
    &self.children
  }

  /// Direct child with the given name
  pub fn child(&self, name: &str) -> Option<&ConfigNode> {
    self.children.iter().find(|child| child.name == name)
  }

  /// Whether this node is a window or section
  pub fn is_group(&self) -> bool {
    matches!(self.value, ConfigValue::Group)
  }

  fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
    self.children.iter_mut().find(|child| child.name == name)
  }

  fn assign(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
    let mismatch = |node: &ConfigValue, value: &Value| ConfigError::TypeMismatch {
      path: path.to_owned(),
      node: node.kind_name(),
      value: value.kind_name(),
    };

    let new_value = match (&self.value, value) {
      (ConfigValue::Range { min, max, step, .. }, Value::Integer(n)) => {
        // Focus drive steps are small, precision loss only starts beyond 2^24
        #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
        let value = n as f32;
        ConfigValue::Range { value, min: *min, max: *max, step: *step }
      }
      (ConfigValue::Text(_), Value::Integer(n)) => ConfigValue::Text(n.to_string()),
      (ConfigValue::Text(_), Value::Text(s)) => ConfigValue::Text(s),
      (ConfigValue::Toggle(_), Value::Toggle(b)) => ConfigValue::Toggle(Some(b)),
      (ConfigValue::Toggle(_), Value::Integer(n)) => ConfigValue::Toggle(Some(n != 0)),
      (ConfigValue::Choice { choices, .. }, Value::Text(s)) => {
        ConfigValue::Choice { current: s, choices: choices.clone() }
      }
      (ConfigValue::Date(_), Value::Integer(n)) => match i32::try_from(n) {
        Ok(timestamp) => ConfigValue::Date(timestamp),
        Err(_) => return Err(mismatch(&self.value, &Value::Integer(n))),
      },
      (node, value) => return Err(mismatch(node, &value)),
    };

    self.value = new_value;
    self.changed = true;
    Ok(())
  }

  fn find_path(&self, name: &str, prefix: &mut Vec<String>) -> bool {
    for child in &self.children {
      prefix.push(child.name.clone());
      if child.name == name || child.find_path(name, prefix) {
        return true;
      }
      prefix.pop();
    }
    false
  }

  fn collect_changes<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a ConfigNode)>) {
    for child in &self.children {
      let path = join_path(prefix, &child.name);
      if child.changed {
        out.push((path.clone(), child));
      }
      child.collect_changes(&path, out);
    }
  }
}

fn join_path(prefix: &str, name: &str) -> String {
  if prefix.is_empty() {
    name.to_owned()
  } else {
    format!("{prefix}/{name}")
  }
}

/// Owned snapshot of the camera configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
  root: ConfigNode,
}

impl ConfigTree {
  /// Wraps a root node
  pub fn new(root: ConfigNode) -> Self {
    Self { root }
  }

  /// Root window of the configuration
  pub fn root(&self) -> &ConfigNode {
    &self.root
  }

  fn segments<'p>(&self, path: &'p str) -> Vec<&'p str> {
    let mut segments: Vec<&str> = path.split(['/', '.']).filter(|s| !s.is_empty()).collect();

    if segments.len() > 1
      && segments[0] == self.root.name
      && self.root.child(segments[0]).is_none()
    {
      segments.remove(0);
    }

    segments
  }

  /// Get the node at `path`
  pub fn get(&self, path: &str) -> Result<&ConfigNode, ConfigError> {
    self
      .segments(path)
      .into_iter()
      .try_fold(&self.root, |node, segment| node.child(segment))
      .ok_or_else(|| ConfigError::NotFound(path.to_owned()))
  }

  fn get_mut(&mut self, path: &str) -> Result<&mut ConfigNode, ConfigError> {
    let segments = self.segments(path);
    let mut node = &mut self.root;

    for segment in segments {
      node = node.child_mut(segment).ok_or_else(|| ConfigError::NotFound(path.to_owned()))?;
    }

    Ok(node)
  }

  /// Whether a node exists at `path`
  pub fn contains(&self, path: &str) -> bool {
    self.get(path).is_ok()
  }

  /// Depth-first lookup of a node by name, returning its path
  pub fn find(&self, name: &str) -> Option<String> {
    let mut path = Vec::new();
    self.root.find_path(name, &mut path).then(|| path.join("/"))
  }

  /// Change the value at `path` in this snapshot.
  ///
  /// Only checks that the node can hold this kind of value, whether the
  /// camera accepts it is decided on commit.
  pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
    self.get_mut(path)?.assign(path, value.into())
  }

  /// Overwrite a value without marking it changed, as a camera does when accepting a commit
  #[cfg(test)]
  pub(crate) fn replace_value(&mut self, path: &str, value: ConfigValue) {
    if let Ok(node) = self.get_mut(path) {
      node.value = value;
    }
  }

  /// Nodes modified since the snapshot was read, with their paths, in tree order
  pub fn changes(&self) -> Vec<(String, &ConfigNode)> {
    let mut changes = Vec::new();
    self.root.collect_changes("", &mut changes);
    changes
  }

  /// Model name as stored in the configuration (`cameramodel`, falling back to `model`)
  pub fn camera_model(&self) -> Option<String> {
    ["cameramodel", "model"].into_iter().find_map(|name| {
      let node = self.get(&self.find(name)?).ok()?;
      match node.value() {
        ConfigValue::Text(model) => Some(model.clone()),
        ConfigValue::Choice { current, .. } => Some(current.clone()),
        _ => None,
      }
    })
  }
}

impl fmt::Display for ConfigValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Group => Ok(()),
      Self::Text(text) => write!(f, "{text:?}"),
      Self::Range { value, min, max, step } => write!(f, "{value} ({min}..={max}, step {step})"),
      Self::Toggle(Some(on)) => f.write_str(if *on { "on" } else { "off" }),
      Self::Toggle(None) => f.write_str("?"),
      Self::Choice { current, choices } => write!(f, "{current:?} of {choices:?}"),
      Self::Button => f.write_str("<button>"),
      Self::Date(timestamp) => write!(f, "@{timestamp}"),
    }
  }
}

impl fmt::Display for ConfigTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn walk(node: &ConfigNode, prefix: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      for child in node.children() {
        let path = join_path(prefix, child.name());
        if child.is_group() {
          writeln!(f, "/{path}")?;
          walk(child, &path, f)?;
        } else {
          let ro = if child.is_readonly() { " (ro)" } else { "" };
          writeln!(f, "/{path} = {}{ro}", child.value())?;
        }
      }
      Ok(())
    }

    walk(&self.root, "", f)
  }
}
