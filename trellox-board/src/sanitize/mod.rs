//! Sanitizer
//!
//! Turns an irregular, possibly cyclic object graph into a persistable one and
//! then into a fully defaulted [`Board`](crate::types::Board). Nothing in here
//! fails: malformed input is absorbed and defaulted.
//!
//! The structural pass ([`sanitize_value`]) walks the graph depth first:
//!
//! - missing and opaque values are dropped from maps and become `null`
//!   elsewhere;
//! - non-finite numbers become `null`;
//! - a container reached a second time (a cycle, or a node shared by two
//!   parents) becomes `null` at every occurrence after the first, so the
//!   walk stays linear in the size of the graph.
//!
//! The typed pass ([`normalize_board`]) then fills in every field the board
//! model requires.

mod defaults;
mod raw;

pub use defaults::{normalize_board, parse_timestamp, sanitize_board};
pub use raw::{OpaqueKind, RawMap, RawSeq, RawValue};

use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tracing::warn;

/// Largest integer exactly representable in an `f64`
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Structurally sanitize `value` into plain JSON
pub fn sanitize_value(value: &RawValue) -> Value {
    let mut walker = Walker::default();
    walker.visit(value).unwrap_or(Value::Null)
}

#[derive(Default)]
struct Walker {
    path: Vec<String>,
    seen: HashSet<usize>,
}

impl Walker {
    /// `None` means "missing": the caller decides whether to drop or null it.
    fn visit(&mut self, value: &RawValue) -> Option<Value> {
        match value {
            RawValue::Missing | RawValue::Opaque(_) => None,
            RawValue::Null => Some(Value::Null),
            RawValue::Bool(b) => Some(Value::Bool(*b)),
            RawValue::Number(n) => Some(number(*n)),
            RawValue::String(s) => Some(Value::String(s.clone())),
            RawValue::Seq(seq) => self.enter(value, |walker| {
                let items = seq.borrow();
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    walker.path.push(index.to_string());
                    out.push(walker.visit(item).unwrap_or(Value::Null));
                    walker.path.pop();
                }
                Value::Array(out)
            }),
            RawValue::Map(map) => self.enter(value, |walker| {
                let fields = map.borrow();
                let mut out = Map::new();
                for (key, field) in fields.iter() {
                    walker.path.push(key.clone());
                    if let Some(v) = walker.visit(field) {
                        out.insert(key.clone(), v);
                    }
                    walker.path.pop();
                }
                Value::Object(out)
            }),
        }
    }

    fn enter(&mut self, node: &RawValue, body: impl FnOnce(&mut Self) -> Value) -> Option<Value> {
        let Some(id) = node.node_id() else {
            return Some(Value::Null);
        };
        if !self.seen.insert(id) {
            warn!(path = %self.path_string(), "repeated reference replaced with null");
            return Some(Value::Null);
        }
        Some(body(self))
    }

    fn path_string(&self) -> String {
        if self.path.is_empty() {
            "$".to_string()
        } else {
            format!("$.{}", self.path.join("."))
        }
    }
}

fn number(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
