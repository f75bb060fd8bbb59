//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use ember_ir::CodeUnit;
use ember_stack::ensure_sufficient_stack;

/// A runtime value.
///
/// Arrays have reference semantics: cloning a `Value::Array` shares the
/// underlying storage, so `$: << "dir"` mutates the search path that the
/// loader reads back.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Proc(Rc<Proc>),
    /// The top-level `self`.
    Main,
}

/// A callable wrapping one code unit.
#[derive(Debug)]
pub struct Proc {
    pub unit: Arc<CodeUnit>,
}

impl Proc {
    pub fn new(unit: Arc<CodeUnit>) -> Self {
        Proc { unit }
    }
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) => "Integer",
            Value::Str(_) => "String",
            Value::Array(_) => "Array",
            Value::Proc(_) => "Proc",
            Value::Main => "Object",
        }
    }

    /// `inspect` rendering, as used by `p`. An array reached again while
    /// it is being rendered prints as `[...]`.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        self.inspect_into(&mut out, &mut Vec::new());
        out
    }

    fn inspect_into(&self, out: &mut String, open: &mut Vec<ArrayId>) {
        match self {
            Value::Nil => out.push_str("nil"),
            Value::Str(s) => out.push_str(&format!("{:?}", &**s)),
            Value::Array(items) => {
                let id = Rc::as_ptr(items);
                if open.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                open.push(id);
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    ensure_sufficient_stack(|| item.inspect_into(out, open));
                }
                out.push(']');
                open.pop();
            }
            other => out.push_str(&other.to_string()),
        }
    }
}

/// Identity of an array's storage, used to detect arrays that contain
/// themselves.
pub(crate) type ArrayId = *const RefCell<Vec<Value>>;

/// `to_s` rendering.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(_) => f.write_str(&self.inspect()),
            Value::Proc(p) => write!(f, "#<Proc:{:p}>", Rc::as_ptr(p)),
            Value::Main => f.write_str("main"),
        }
    }
}

/// Structural equality for data, identity for procs.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structurally_equal(self, other, &mut Vec::new())
    }
}

/// A pair of arrays met again while already being compared is taken as
/// equal, so self-referential arrays compare without unbounded recursion.
fn structurally_equal(a: &Value, b: &Value, open: &mut Vec<(ArrayId, ArrayId)>) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) | (Value::Main, Value::Main) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
            if open.contains(&pair) {
                return true;
            }
            let (lhs, rhs) = (a.borrow(), b.borrow());
            if lhs.len() != rhs.len() {
                return false;
            }
            open.push(pair);
            let equal = lhs
                .iter()
                .zip(rhs.iter())
                .all(|(l, r)| ensure_sufficient_stack(|| structurally_equal(l, r, open)));
            open.pop();
            equal
        }
        (Value::Proc(a), Value::Proc(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
