//! Message tree types.
//!
//! A message tree is the nested form of translation messages
//! (`{ date: { formats: { default: "%m/%d/%Y" } } }`). Leaves are either a
//! single string or an ordered list of strings; inner nodes map string keys to
//! further trees.

pub mod codec;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{
    Deserialize,
    Serialize,
};
use serde_yaml::Value;
use thiserror::Error;

/// Nested mapping from key segment to subtree.
pub type MessageMap = BTreeMap<String, MessageTree>;

/// Language identifier to that language's message tree.
pub type OverrideTree = MessageMap;

/// Dotted key path (`"date.formats.default"`) to leaf value.
pub type FlatMapping = BTreeMap<String, LeafValue>;

/// A leaf in a message tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeafValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for LeafValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LeafValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for LeafValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Text is written as is; lists as a flow sequence of YAML double-quoted
/// strings (`["a", "b"]`) that [`codec::parse_leaf_value`] reads back.
impl std::fmt::Display for LeafValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::List(items) => {
                f.write_char('[')?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write_double_quoted(f, item)?;
                }
                f.write_char(']')
            }
        }
    }
}

/// Writes `value` as a YAML double-quoted scalar.
///
/// Characters outside the YAML printable set and line breaks are written as
/// escapes, so the scalar stays on one line and parses back unchanged.
fn write_double_quoted(f: &mut std::fmt::Formatter<'_>, value: &str) -> std::fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\t' => f.write_str("\\t")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\u{20}'..='\u{7E}'
            | '\u{A0}'..='\u{2027}'
            | '\u{202A}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FEFE}'
            | '\u{FF00}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}' => f.write_char(c)?,
            _ => match u32::from(c) {
                code @ 0..=0xFF => write!(f, "\\x{code:02X}")?,
                code => write!(f, "\\u{code:04X}")?,
            },
        }
    }
    f.write_char('"')
}

/// A node of a message tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageTree {
    Leaf(LeafValue),
    Node(MessageMap),
}

impl MessageTree {
    /// Returns the child mapping if this is an inner node.
    #[must_use]
    pub const fn as_node(&self) -> Option<&MessageMap> {
        match self {
            Self::Node(map) => Some(map),
            Self::Leaf(_) => None,
        }
    }

    /// Builds a tree from a parsed YAML document.
    ///
    /// Scalars (strings, numbers, booleans) become text leaves, sequences of
    /// scalars become list leaves and mappings become nodes. `null` becomes an
    /// empty string.
    ///
    /// # Errors
    /// Returns [`TreeShapeError`] for mappings or sequences nested inside a
    /// sequence, tagged values, and mapping keys that are not scalars.
    pub fn from_yaml(value: &Value) -> Result<Self, TreeShapeError> {
        Self::from_yaml_at(value, "")
    }

    /// Recursive worker for [`Self::from_yaml`]; `path` is the dotted path of `value`.
    fn from_yaml_at(value: &Value, path: &str) -> Result<Self, TreeShapeError> {
        match value {
            Value::Mapping(mapping) => {
                let mut node = MessageMap::new();
                for (key, child) in mapping {
                    let Some(key) = scalar_to_string(key) else {
                        return Err(TreeShapeError::new(path, "mapping key is not a scalar"));
                    };
                    let child_path = join_path(path, &key);
                    node.insert(key, Self::from_yaml_at(child, &child_path)?);
                }
                Ok(Self::Node(node))
            }
            Value::Sequence(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let Some(text) = scalar_to_string(item) else {
                        return Err(TreeShapeError::new(
                            path,
                            "list items must be strings, not nested lists or mappings",
                        ));
                    };
                    list.push(text);
                }
                Ok(Self::Leaf(LeafValue::List(list)))
            }
            Value::Tagged(_) => Err(TreeShapeError::new(path, "tagged values are not supported")),
            scalar => Ok(Self::Leaf(LeafValue::Text(scalar_to_string(scalar).unwrap_or_default()))),
        }
    }
}

/// A YAML value that cannot be represented as a [`MessageTree`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported value at '{path}': {reason}")]
pub struct TreeShapeError {
    /// Dotted path to the offending value (empty for the document root).
    pub path: String,
    pub reason: String,
}

impl TreeShapeError {
    /// エラーを作成する
    fn new(path: &str, reason: &str) -> Self {
        Self { path: path.to_string(), reason: reason.to_string() }
    }
}

/// Converts a YAML scalar to its string form; `None` for non-scalars.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Joins a parent path and a key with `.`.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() { key.to_string() } else { format!("{prefix}.{key}") }
}

/// Deep-merges `other` into `base`.
///
/// Nodes present on both sides are merged key by key; in every other case
/// the value from `other` replaces the one in `base`.
pub fn deep_merge(base: &mut MessageMap, other: MessageMap) {
    for (key, incoming) in other {
        match (base.get_mut(&key), incoming) {
            (Some(MessageTree::Node(existing)), MessageTree::Node(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, incoming) => {
                base.insert(key, incoming);
            }
        }
    }
}
