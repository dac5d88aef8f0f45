// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic payload values exchanged on the message bus.
//!
//! Modules declare their inputs and outputs with manifest type strings
//! (`str`, `int`, `List[str]`, `Dict[str, Any]`, …). At run time every
//! payload is a [`Value`]; [`Value::satisfies`] checks a payload against a
//! declared [`TypeName`] and the translator handles the rest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A declared type string from a module manifest.
///
/// Stored verbatim; structural questions go through [`TypeName::shape`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(SmolStr);

impl TypeName {
    pub const ANY: &'static str = "Any";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    pub fn any() -> Self {
        Self::new(Self::ANY)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_any(&self) -> bool {
        matches!(self.shape(), TypeShape::Any)
    }

    /// Parse the type string into a structural shape.
    ///
    /// The base name is matched case-insensitively (`list`, `List`), the
    /// bracketed element type recursively. Unrecognized names become
    /// [`TypeShape::Other`] and only match opaque payloads with the same tag.
    pub fn shape(&self) -> TypeShape {
        parse_shape(self.as_str())
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Structural view of a [`TypeName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Any,
    Str,
    Int,
    Float,
    Bool,
    /// `list` (element type unconstrained) or `List[T]`.
    List(Option<Box<TypeShape>>),
    /// `dict` / `Dict[K, V]`; value types are not enforced.
    Dict,
    /// An unrecognized name, matched against opaque payload tags.
    Other(SmolStr),
}

fn parse_shape(raw: &str) -> TypeShape {
    let raw = raw.trim();
    if let Some(open) = raw.find('[') {
        if let Some(inner) = raw[open + 1..].strip_suffix(']') {
            let base = raw[..open].trim().to_ascii_lowercase();
            return match base.as_str() {
                "list" => TypeShape::List(Some(Box::new(parse_shape(inner)))),
                "dict" | "map" => TypeShape::Dict,
                _ => TypeShape::Other(SmolStr::new(raw)),
            };
        }
    }
    match raw.to_ascii_lowercase().as_str() {
        "any" | "" => TypeShape::Any,
        "str" | "string" => TypeShape::Str,
        "int" | "integer" => TypeShape::Int,
        "float" => TypeShape::Float,
        "bool" | "boolean" => TypeShape::Bool,
        "list" => TypeShape::List(None),
        "dict" | "map" => TypeShape::Dict,
        _ => TypeShape::Other(SmolStr::new(raw)),
    }
}

/// A dynamically typed payload.
///
/// Declared types that no variant can represent travel as
/// [`Value::Opaque`], carrying the type tag and raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Opaque { tag: String, bytes: Vec<u8> },
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Runtime type name of this payload, in manifest vocabulary.
    pub fn type_name(&self) -> TypeName {
        match self {
            Value::Null => TypeName::new("None"),
            Value::Bool(_) => TypeName::new("bool"),
            Value::Int(_) => TypeName::new("int"),
            Value::Float(_) => TypeName::new("float"),
            Value::Str(_) => TypeName::new("str"),
            Value::List(_) => TypeName::new("list"),
            Value::Map(_) => TypeName::new("dict"),
            Value::Opaque { tag, .. } => TypeName::new(tag),
        }
    }

    /// Does this payload satisfy the declared type?
    pub fn satisfies(&self, declared: &TypeName) -> bool {
        self.satisfies_shape(&declared.shape())
    }

    fn satisfies_shape(&self, shape: &TypeShape) -> bool {
        match (shape, self) {
            (TypeShape::Any, _) => true,
            (TypeShape::Str, Value::Str(_)) => true,
            (TypeShape::Int, Value::Int(_)) => true,
            (TypeShape::Float, Value::Float(_)) => true,
            (TypeShape::Bool, Value::Bool(_)) => true,
            (TypeShape::List(None), Value::List(_)) => true,
            (TypeShape::List(Some(elem)), Value::List(items)) => {
                items.iter().all(|v| v.satisfies_shape(elem))
            }
            (TypeShape::Dict, Value::Map(_)) => true,
            (TypeShape::Other(tag), Value::Opaque { tag: t, .. }) => tag == t,
            _ => false,
        }
    }

    /// Empty payloads are delivered but warned about at publish time.
    pub fn is_empty_payload(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short single-line preview for logs and cache keys.
    pub fn preview(&self, max_chars: usize) -> String {
        let rendered = match self {
            Value::Str(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| "<value>".to_string()),
        };
        if rendered.chars().count() <= max_chars {
            rendered
        } else {
            rendered.chars().take(max_chars).collect()
        }
    }

    /// Convert parsed YAML (pipeline config, translation rule files) into a
    /// payload. Tagged YAML nodes lose their tag; non-string keys are
    /// rendered with `Display`.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Value {
        match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_yaml::Value::String(s) => Value::Str(s),
            serde_yaml::Value::Sequence(items) => {
                Value::List(items.into_iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => {
                let mut out = IndexMap::new();
                for (k, v) in map {
                    let key = match k {
                        serde_yaml::Value::String(s) => s,
                        other => serde_yaml::to_string(&other)
                            .map(|s| s.trim_end().to_string())
                            .unwrap_or_default(),
                    };
                    out.insert(key, Value::from_yaml(v));
                }
                Value::Map(out)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(Value::from).collect())
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
