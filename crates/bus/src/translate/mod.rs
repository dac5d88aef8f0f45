// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule-driven coercion between declared bus types.
//!
//! Translation is strictly best-effort and non-disruptive: `convert` never
//! fails the caller. On any miss or internal problem the original value
//! comes back unchanged with `success = false`.

mod rules;

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, warn};

use wr_core::{Envelope, TypeName, TypeShape, Value};

pub use rules::{default_rules, load_rules, Method, Rule, RuleLoadError};

/// Cache entries keyed by the conversion pair plus a short value preview.
type CacheKey = (String, String, String);

const CACHE_PREVIEW_CHARS: usize = 100;
const MAX_CACHE_SIZE: usize = 100;

pub struct TypeTranslator {
    rules: Vec<Rule>,
    cache: Mutex<HashMap<CacheKey, Value>>,
}

impl Default for TypeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTranslator {
    /// Translator with the built-in default rule set.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Translator with rules from a config file layered over the defaults.
    /// Load failures are logged and the defaults used alone.
    pub fn with_rules_file(path: &Path) -> Self {
        let mut rules = match load_rules(path) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to load translation rules, using defaults"
                );
                vec![]
            }
        };
        rules.extend(default_rules());
        Self {
            rules,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Is there a rule (or identity) covering this conversion?
    pub fn can_convert(&self, from: &TypeName, to: &TypeName) -> bool {
        from.shape() == to.shape() || self.find_rule(from, to).is_some()
    }

    /// Convert `value` from one declared type to another.
    ///
    /// Returns the converted value and `true`, or the original value and
    /// `false` when no rule applies or the conversion does not hold.
    pub fn convert(&self, value: &Value, from: &TypeName, to: &TypeName) -> (Value, bool) {
        if from.shape() == to.shape() {
            return (value.clone(), true);
        }

        let key = cache_key(value, from, to);
        if let Some(hit) = self.cache.lock().get(&key) {
            return (hit.clone(), true);
        }

        let Some(rule) = self.find_rule(from, to) else {
            debug!(%from, %to, "no conversion rule");
            return (value.clone(), false);
        };

        let Some(converted) = apply(rule.method, value, to) else {
            warn!(%from, %to, "conversion failed, passing value through");
            return (value.clone(), false);
        };

        let mut cache = self.cache.lock();
        if cache.len() >= MAX_CACHE_SIZE {
            cache.clear();
        }
        cache.insert(key, converted.clone());
        (converted, true)
    }

    /// Rewrite the envelope's payload and declared type in place when the
    /// expected type can be satisfied. Returns whether a rewrite happened.
    pub fn translate_envelope(&self, envelope: &mut Envelope, expected: &TypeName) -> bool {
        if expected.is_any() || envelope.data_type.shape() == expected.shape() {
            return false;
        }
        // A topic declared `Any` says nothing useful about the payload;
        // convert from its runtime type instead.
        let from = if envelope.data_type.is_any() {
            envelope.data.type_name()
        } else {
            envelope.data_type.clone()
        };
        let (converted, ok) = self.convert(&envelope.data, &from, expected);
        if ok {
            envelope.data = converted;
            envelope.data_type = expected.clone();
        }
        ok
    }

    /// The cache is purely an optimization and may be dropped at any time.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn find_rule(&self, from: &TypeName, to: &TypeName) -> Option<&Rule> {
        let (from, to) = (from.shape(), to.shape());
        self.rules
            .iter()
            .find(|r| r.from.shape() == from && r.to.shape() == to)
    }
}

fn cache_key(value: &Value, from: &TypeName, to: &TypeName) -> CacheKey {
    (
        from.as_str().to_string(),
        to.as_str().to_string(),
        value.preview(CACHE_PREVIEW_CHARS),
    )
}

fn apply(method: Method, value: &Value, to: &TypeName) -> Option<Value> {
    match method {
        Method::SimpleCast => simple_cast(value, &to.shape()),
        Method::SplitString => split_string(value),
        Method::StringToBool => Some(string_to_bool(value)),
    }
}

fn simple_cast(value: &Value, target: &TypeShape) -> Option<Value> {
    match (value, target) {
        (Value::Int(n), TypeShape::Str) => Some(Value::Str(n.to_string())),
        (Value::Float(f), TypeShape::Str) => Some(Value::Str(f.to_string())),
        (Value::Bool(b), TypeShape::Str) => Some(Value::Str(b.to_string())),
        (Value::Str(s), TypeShape::Int) => s.trim().parse::<i64>().ok().map(Value::Int),
        (Value::Str(s), TypeShape::Float) => s.trim().parse::<f64>().ok().map(Value::Float),
        (Value::Int(n), TypeShape::Float) => Some(Value::Float(*n as f64)),
        _ => None,
    }
}

/// Split a string into `List[str]`, preferring commas, then newlines, then
/// whitespace. Lists pass through unchanged.
fn split_string(value: &Value) -> Option<Value> {
    let text = match value {
        Value::List(_) => return Some(value.clone()),
        Value::Str(s) => s,
        _ => return None,
    };
    if text.is_empty() {
        return Some(Value::List(vec![]));
    }
    let parts: Vec<Value> = if text.contains(',') {
        text.split(',')
            .map(|item| Value::Str(item.trim().to_string()))
            .collect()
    } else if text.contains('\n') {
        text.lines()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::Str(item.to_string()))
            .collect()
    } else {
        text.split_whitespace()
            .map(|item| Value::Str(item.to_string()))
            .collect()
    };
    Some(Value::List(parts))
}

/// Common truthy/falsy spellings; anything else is truthy when non-empty.
fn string_to_bool(value: &Value) -> Value {
    match value {
        Value::Str(s) => {
            let lowered = s.trim().to_lowercase();
            let parsed = match lowered.as_str() {
                "true" | "yes" | "y" | "1" | "on" => true,
                "false" | "no" | "n" | "0" | "off" => false,
                other => !other.is_empty(),
            };
            Value::Bool(parsed)
        }
        Value::Bool(b) => Value::Bool(*b),
        Value::Int(n) => Value::Bool(*n != 0),
        other => Value::Bool(!other.is_empty_payload()),
    }
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
