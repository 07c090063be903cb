//! Captured — closed tagged variant for untrusted runtime values.
//!
//! Container nodes are reference-counted cells so self-referential graphs
//! are representable; the cell's pointer identity is what the serializer
//! tracks on the current recursion path.

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedSeq = Rc<RefCell<Vec<Captured>>>;
pub type SharedMap = Rc<RefCell<Vec<(String, Captured)>>>;

#[derive(Debug, Clone)]
pub enum Captured {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integer too large for i64, kept in string form.
    BigInt(String),
    Str(String),
    /// Unique-symbol-like value, kept by its description.
    Symbol(String),
    /// Callable value; `None` means anonymous.
    Callable(Option<String>),
    Error {
        name: String,
        message: String,
        stack: Option<String>,
    },
    Date(DateTime<Utc>),
    /// Environment-specific handle (e.g. a UI element).
    Handle { tag: String, id: Option<String> },
    Array(SharedSeq),
    Map(SharedMap),
}

impl Captured {
    pub fn str(s: impl Into<String>) -> Self {
        Captured::Str(s.into())
    }

    pub fn array(items: Vec<Captured>) -> Self {
        Captured::Array(Rc::new(RefCell::new(items)))
    }

    pub fn map<K: Into<String>>(entries: Vec<(K, Captured)>) -> Self {
        Captured::Map(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Captured::Error {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }
}

/// Classification tags the serializer dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Primitive,
    Str,
    Callable,
    Error,
    Date,
    Handle,
    /// The value is an ancestor currently being serialized.
    CyclicRef,
    ArrayLike,
    MapLike,
}

/// Explicit type probe: map a value to its dispatch tag, treating a
/// container already on the recursion path as a cyclic reference.
pub fn classify(value: &Captured, visiting: &[usize]) -> ValueKind {
    match value {
        Captured::Null
        | Captured::Bool(_)
        | Captured::Int(_)
        | Captured::Float(_)
        | Captured::BigInt(_)
        | Captured::Symbol(_) => ValueKind::Primitive,
        Captured::Str(_) => ValueKind::Str,
        Captured::Callable(_) => ValueKind::Callable,
        Captured::Error { .. } => ValueKind::Error,
        Captured::Date(_) => ValueKind::Date,
        Captured::Handle { .. } => ValueKind::Handle,
        Captured::Array(cell) => {
            if visiting.contains(&addr(cell)) {
                ValueKind::CyclicRef
            } else {
                ValueKind::ArrayLike
            }
        }
        Captured::Map(cell) => {
            if visiting.contains(&addr(cell)) {
                ValueKind::CyclicRef
            } else {
                ValueKind::MapLike
            }
        }
    }
}

/// Pointer identity of a shared container cell.
pub(crate) fn addr<T>(cell: &Rc<T>) -> usize {
    Rc::as_ptr(cell) as *const () as usize
}
