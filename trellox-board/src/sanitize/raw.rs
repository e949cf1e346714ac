//! Loosely typed input graphs
//!
//! `RawValue` models data of unknown shape as it arrives from foreign sources:
//! fields may be absent, hold values that cannot be persisted, or point back
//! at an ancestor. Containers are reference counted so one node can be shared
//! by several parents, or by itself.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type RawSeq = Rc<RefCell<Vec<RawValue>>>;
pub type RawMap = Rc<RefCell<BTreeMap<String, RawValue>>>;

/// Kinds of values that have no persistable form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    Function,
    Symbol,
}

#[derive(Debug, Clone)]
pub enum RawValue {
    /// An explicitly absent value
    Missing,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Opaque(OpaqueKind),
    Seq(RawSeq),
    Map(RawMap),
}

impl RawValue {
    pub fn seq(items: impl IntoIterator<Item = RawValue>) -> Self {
        RawValue::Seq(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn map<K: Into<String>>(fields: impl IntoIterator<Item = (K, RawValue)>) -> Self {
        RawValue::Map(Rc::new(RefCell::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn string(s: impl Into<String>) -> Self {
        RawValue::String(s.into())
    }

    /// Set a field on a map node. Returns false when this is not a map.
    ///
    /// Because map nodes are shared, the change is visible through every
    /// handle to the node, which is how cycles are built.
    pub fn set(&self, key: impl Into<String>, value: RawValue) -> bool {
        match self {
            RawValue::Map(map) => {
                map.borrow_mut().insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Append to a sequence node. Returns false when this is not a sequence.
    pub fn push(&self, value: RawValue) -> bool {
        match self {
            RawValue::Seq(seq) => {
                seq.borrow_mut().push(value);
                true
            }
            _ => false,
        }
    }

    /// Identity of a container node, used for cycle detection
    pub(crate) fn node_id(&self) -> Option<usize> {
        match self {
            RawValue::Seq(seq) => Some(Rc::as_ptr(seq) as *const () as usize),
            RawValue::Map(map) => Some(Rc::as_ptr(map) as *const () as usize),
            _ => None,
        }
    }
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Null),
            Value::String(s) => RawValue::String(s.clone()),
            Value::Array(items) => RawValue::seq(items.iter().map(RawValue::from)),
            Value::Object(fields) => {
                RawValue::map(fields.iter().map(|(k, v)| (k.clone(), RawValue::from(v))))
            }
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::from(&value)
    }
}
