//! The prelude plugin: bindings for the built-in types plus cheap
//! constructors for primitive values.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    ast::{SymbolId, SymbolTables, TableId},
    runtime::ExternPlugin,
    value::{AnyType, DictKey, PreludeType, SimpleType, Value},
};

/// Binds `Array`, `Bool`, `Char`, `Dict`, `Float`, `Func`, `Int`, `Module`,
/// `String`, `Null` and `Any`.
pub struct Prelude;

impl ExternPlugin for Prelude {
    fn bind(&self, tables: &SymbolTables, _table: TableId, symbol: SymbolId) -> Option<Value> {
        let name = tables.symbol(symbol).name.as_str();
        let ty = match name {
            "Array" => PreludeType::Array,
            "Bool" => PreludeType::Bool,
            "Char" => PreludeType::Char,
            "Dict" => PreludeType::Dict,
            "Float" => PreludeType::Float,
            "Func" => PreludeType::Func,
            "Int" => PreludeType::Int,
            "Module" => PreludeType::Module,
            "String" => PreludeType::String,
            "Null" => PreludeType::Null,
            "Any" => return Some(Value::AnyType(Arc::new(AnyType { symbol }))),
            _ => return None,
        };
        Some(Value::SimpleType(Arc::new(SimpleType { name: name.to_owned(), type_id: ty.type_id() })))
    }
}

impl Prelude {
    #[must_use]
    pub fn null(&self) -> Value {
        Value::Null
    }

    #[must_use]
    pub fn bool(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    #[must_use]
    pub fn int(&self, value: i64) -> Value {
        Value::Int(value)
    }

    #[must_use]
    pub fn float(&self, value: f64) -> Value {
        Value::Float(value)
    }

    #[must_use]
    pub fn char(&self, value: char) -> Value {
        Value::Char(value)
    }

    #[must_use]
    pub fn string(&self, value: impl Into<Arc<str>>) -> Value {
        Value::String(value.into())
    }

    #[must_use]
    pub fn array(&self, values: Vec<Value>) -> Value {
        Value::Array(Arc::new(values))
    }

    #[must_use]
    pub fn dict(&self, entries: IndexMap<DictKey, Value>) -> Value {
        Value::Dict(Arc::new(entries))
    }
}
