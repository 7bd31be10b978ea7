//! Runtime values.
//!
//! A closed sum of variants: small primitives are stored inline, aggregates
//! (strings, arrays, dicts, data instances) share by reference via `Arc` and
//! are never mutated after construction, so values may cross task
//! boundaries freely. There is no garbage collector.
//!
//! Every value answers its [`TypeId`], a printable [`Value::inspect`] form,
//! and member lookup by name; callable values additionally expose an arity.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use strum::{Display, FromRepr};

use crate::ast::SymbolId;

/// The type-constant id carried by every value and compared by the
/// `AssertType` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u16);

/// Fixed type ids for the prelude data types.
///
/// These are not guaranteed to be stable across versions and are not safe
/// to serialise; they exist so literals get their type id without a symbol
/// lookup, and so the compiler can emit `AssertType` operands directly.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
pub enum PreludeType {
    Array = 0,
    Bool,
    Char,
    Dict,
    Float,
    Func,
    Int,
    Module,
    String,
    Null,
    Any,
}

impl PreludeType {
    #[must_use]
    pub fn type_id(self) -> TypeId {
        TypeId(self as u16)
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// One Unicode scalar.
    Char(char),
    String(Arc<str>),
    /// Ordered sequence; index 0 is the first element in source order.
    Array(Arc<Vec<Value>>),
    /// Insertion-order-preserving mapping.
    Dict(Arc<IndexMap<DictKey, Value>>),
    /// An instance of a user-declared `data` type.
    Data(Arc<DataValue>),
    DataType(Arc<DataType>),
    EnumType(Arc<EnumType>),
    /// A built-in prelude type such as `Int` or `String`.
    SimpleType(Arc<SimpleType>),
    /// The `Any` type, which matches every value.
    AnyType(Arc<AnyType>),
    ExternFunc(Arc<ExternFunc>),
    Function(Arc<CompiledFunction>),
    /// A compiled function paired with its captured free values.
    Closure(Arc<Closure>),
}

/// A dict key: the hashable subset of values.
///
/// Floats key by their bit pattern; aggregate and callable values are not
/// hashable and are rejected by the `Dict` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Char(char),
    String(Arc<str>),
}

impl DictKey {
    /// Converts a value into a key; `None` for unhashable values.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Float(f) => Some(Self::Float(f.to_bits())),
            Value::Char(c) => Some(Self::Char(*c)),
            Value::String(s) => Some(Self::String(Arc::clone(s))),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Self::Char(c) => Value::Char(*c),
            Self::String(s) => Value::String(Arc::clone(s)),
        }
    }
}

/// A user `data` type: the constructor callable and field layout.
#[derive(Debug)]
pub struct DataType {
    pub symbol: SymbolId,
    /// This type's slot in the constant pool; doubles as the type id of its
    /// instances.
    pub constant_id: u16,
    pub name: String,
    /// Field names in declaration order.
    pub fields: Vec<String>,
}

/// An instance of a [`DataType`]; fields are addressed by name through the
/// type's field order.
#[derive(Debug)]
pub struct DataValue {
    pub ty: Arc<DataType>,
    pub values: Vec<Value>,
}

/// A user `enum` type.
#[derive(Debug)]
pub struct EnumType {
    pub symbol: SymbolId,
    pub constant_id: u16,
    pub name: String,
    pub cases: Vec<String>,
}

/// A built-in prelude type bound by the prelude plugin.
#[derive(Debug)]
pub struct SimpleType {
    pub name: String,
    pub type_id: TypeId,
}

/// The `Any` type.
#[derive(Debug)]
pub struct AnyType {
    pub symbol: SymbolId,
}

/// Host implementation of an `extern func`.
pub type ExternFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// An externally-implemented function bound by a plugin.
pub struct ExternFunc {
    pub symbol: SymbolId,
    pub name: String,
    pub arity: usize,
    pub implementation: ExternFn,
}

impl fmt::Debug for ExternFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternFunc")
            .field("symbol", &self.symbol)
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A function compiled to bytecode.
#[derive(Debug)]
pub struct CompiledFunction {
    pub instructions: Arc<[u8]>,
    /// Number of declared parameters.
    pub params: usize,
    /// The declaring symbol; `None` for anonymous function literals.
    pub symbol: Option<SymbolId>,
    pub name: String,
    /// Frame size: parameters plus the function scope's own symbols, minus
    /// captured free symbols (those live in the closure, not the frame).
    pub frame_locals: usize,
}

/// A compiled function paired with captured free values.
#[derive(Debug)]
pub struct Closure {
    pub function: Arc<CompiledFunction>,
    pub free: Vec<Value>,
}

impl Value {
    /// The type-constant id compared by `AssertType` and `Equal`.
    #[must_use]
    pub fn type_constant_id(&self) -> TypeId {
        match self {
            Self::Null => PreludeType::Null.type_id(),
            Self::Bool(_) => PreludeType::Bool.type_id(),
            Self::Int(_) => PreludeType::Int.type_id(),
            Self::Float(_) => PreludeType::Float.type_id(),
            Self::Char(_) => PreludeType::Char.type_id(),
            Self::String(_) => PreludeType::String.type_id(),
            Self::Array(_) => PreludeType::Array.type_id(),
            Self::Dict(_) => PreludeType::Dict.type_id(),
            Self::Data(data) => TypeId(data.ty.constant_id),
            Self::DataType(ty) => TypeId(ty.constant_id),
            Self::EnumType(ty) => TypeId(ty.constant_id),
            Self::SimpleType(ty) => ty.type_id,
            Self::AnyType(_) => PreludeType::Any.type_id(),
            Self::ExternFunc(_) | Self::Function(_) | Self::Closure(_) => PreludeType::Func.type_id(),
        }
    }

    /// Short name of the value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Char(_) => "Char",
            Self::String(_) => "String",
            Self::Array(_) => "Array",
            Self::Dict(_) => "Dict",
            Self::Data(data) => &data.ty.name,
            Self::DataType(ty) => &ty.name,
            Self::EnumType(ty) => &ty.name,
            Self::SimpleType(ty) => &ty.name,
            Self::AnyType(_) => "Any",
            Self::ExternFunc(_) => "ExternFunc",
            Self::Function(_) | Self::Closure(_) => "Func",
        }
    }

    /// Printable form for diagnostics and inspection.
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Char(c) => c.to_string(),
            Self::String(s) => s.to_string(),
            Self::Array(elements) => {
                let rendered: Vec<String> = elements.iter().map(Self::inspect).collect();
                format!("[{}]", rendered.join(", "))
            }
            Self::Dict(entries) => {
                if entries.is_empty() {
                    return "[:]".to_owned();
                }
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.to_value().inspect(), value.inspect()))
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            Self::Data(data) => {
                let rendered: Vec<String> = data.values.iter().map(Self::inspect).collect();
                format!("{}({})", data.ty.name, rendered.join(", "))
            }
            Self::DataType(ty) => format!("data {}", ty.name),
            Self::EnumType(ty) => format!("enum {}", ty.name),
            Self::SimpleType(ty) => format!("extern {}", ty.name),
            Self::AnyType(_) => "extern Any".to_owned(),
            Self::ExternFunc(f) => format!("extern {}(#{})", f.name, f.arity),
            Self::Function(f) => format!("func {}(#{})", f.name, f.params),
            Self::Closure(c) => format!("func {}(#{})", c.function.name, c.function.params),
        }
    }

    /// Resolves a member by name; `None` for unknown members.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        match self {
            Self::Data(data) => {
                let position = data.ty.fields.iter().position(|field| field == name)?;
                data.values.get(position).cloned()
            }
            Self::Function(f) if name == "arity" => Some(Self::Int(i64::try_from(f.params).unwrap_or(i64::MAX))),
            Self::Closure(c) if name == "arity" => {
                Some(Self::Int(i64::try_from(c.function.params).unwrap_or(i64::MAX)))
            }
            Self::ExternFunc(f) if name == "arity" => Some(Self::Int(i64::try_from(f.arity).unwrap_or(i64::MAX))),
            _ => None,
        }
    }

    /// The number of arguments a callable value expects; `None` for
    /// non-callable values.
    #[must_use]
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::Function(f) => Some(f.params),
            Self::Closure(c) => Some(c.function.params),
            Self::DataType(ty) => Some(ty.fields.len()),
            Self::ExternFunc(f) => Some(f.arity),
            _ => None,
        }
    }
}

/// Value equality as performed by `Equal`/`NotEqual`.
///
/// Type-constant ids must match first. Primitives compare by value,
/// aggregates structurally, and function and type values by identity.
#[must_use]
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    if lhs.type_constant_id() != rhs.type_constant_id() {
        return false;
    }
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Char(a), Value::Char(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Dict(a), Value::Dict(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
        }
        (Value::Data(a), Value::Data(b)) => {
            a.values.len() == b.values.len() && a.values.iter().zip(b.values.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::DataType(a), Value::DataType(b)) => Arc::ptr_eq(a, b),
        (Value::EnumType(a), Value::EnumType(b)) => Arc::ptr_eq(a, b),
        (Value::SimpleType(a), Value::SimpleType(b)) => Arc::ptr_eq(a, b),
        (Value::AnyType(a), Value::AnyType(b)) => Arc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
        (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
        (Value::ExternFunc(a), Value::ExternFunc(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_equality_requires_matching_type_ids() {
        assert!(values_equal(&Value::Int(3), &Value::Int(3)));
        assert!(!values_equal(&Value::Int(3), &Value::Float(3.0)));
        assert!(values_equal(&Value::Null, &Value::Null));
    }

    #[test]
    fn arrays_compare_structurally() {
        let a = Value::Array(Arc::new(vec![Value::Int(1), Value::Int(2)]));
        let b = Value::Array(Arc::new(vec![Value::Int(1), Value::Int(2)]));
        let c = Value::Array(Arc::new(vec![Value::Int(2), Value::Int(1)]));
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn unhashable_values_make_no_dict_key() {
        assert!(DictKey::from_value(&Value::Array(Arc::new(Vec::new()))).is_none());
        assert!(DictKey::from_value(&Value::String("k".into())).is_some());
    }
}
