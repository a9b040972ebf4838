// Strongly-typed schema model. Documents are lowered into this in `document`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::bound::Bound;

/// A schema node: its structural type plus any opaque annotations carried
/// over from the source document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "crate::document::RawSchema", into = "crate::document::RawSchema")]
pub struct Schema {
    pub ty: Ty,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ty {
    Any,                     // top: admits every value
    Number,
    Integer,
    Boolean,
    String,
    Enum(Vec<Literal>),      // non-empty
    Array(ArrTy),
    Object(ObjTy),
    AnyOf(Vec<Schema>),      // non-empty
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrTy {
    pub items: Items,
    pub min_items: u64,
    pub max_items: Bound,
    /// Whether `min_items` was given explicitly rather than defaulted.
    pub min_stated: Stated,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Items {
    /// Homogeneous sequence.
    List(Box<Schema>),
    /// Fixed-width row; `max_items` equals the number of positions.
    Tuple(Vec<Schema>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjTy {
    pub properties: BTreeMap<String, Schema>,
    pub required: BTreeSet<String>,
    pub additional_properties: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LitKind { Null, Bool, Number, String }

/// A flag carried alongside the structure that does not change which
/// values a schema admits. Never compared, ordered, or hashed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stated(pub bool);

/// Unrecognized document fields (descriptions, `$schema`, ...), kept in
/// document order. Never compared, ordered, or hashed.
#[derive(Debug, Clone, Default)]
pub struct Annotations(IndexMap<String, Value>);

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA
// ————————————————————————————————————————————————————————————————————————————

impl From<Ty> for Schema {
    fn from(ty: Ty) -> Self {
        Self { ty, annotations: Annotations::default() }
    }
}

impl Schema {
    pub fn any() -> Self { Ty::Any.into() }
    pub fn number() -> Self { Ty::Number.into() }
    pub fn integer() -> Self { Ty::Integer.into() }
    pub fn boolean() -> Self { Ty::Boolean.into() }
    pub fn string() -> Self { Ty::String.into() }

    pub fn enumeration<I: IntoIterator<Item = Literal>>(values: I) -> Self {
        Ty::Enum(values.into_iter().collect()).into()
    }

    pub fn array(item: Schema, min_items: u64, max_items: impl Into<Bound>) -> Self {
        Ty::Array(ArrTy {
            items: Items::List(Box::new(item)),
            min_items,
            max_items: max_items.into(),
            min_stated: Stated(true),
        }).into()
    }

    /// Homogeneous array without cardinality bounds.
    pub fn list(item: Schema) -> Self {
        Ty::Array(ArrTy {
            items: Items::List(Box::new(item)),
            min_items: 0,
            max_items: Bound::Unbounded,
            min_stated: Stated(false),
        }).into()
    }

    /// Fixed-width row: exactly one position per element of `items`.
    pub fn tuple<I: IntoIterator<Item = Schema>>(items: I) -> Self {
        let items: Vec<Schema> = items.into_iter().collect();
        let n = items.len() as u64;
        Ty::Array(ArrTy {
            items: Items::Tuple(items),
            min_items: n,
            max_items: Bound::Finite(n),
            min_stated: Stated(true),
        }).into()
    }

    pub fn object<P, R, K>(properties: P, required: R, additional_properties: bool) -> Self
    where
        P: IntoIterator<Item = (K, Schema)>,
        R: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Ty::Object(ObjTy {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            required: required.into_iter().map(Into::into).collect(),
            additional_properties,
        }).into()
    }

    pub fn any_of<I: IntoIterator<Item = Schema>>(alternatives: I) -> Self {
        Ty::AnyOf(alternatives.into_iter().collect()).into()
    }

    /// Attach a human-readable description (an annotation).
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.annotations.insert("description", Value::String(text.into()));
        self
    }

    /// True for `Any` and for unions with an unconstrained alternative.
    pub fn is_top(&self) -> bool {
        match &self.ty {
            Ty::Any => true,
            Ty::AnyOf(alts) => alts.iter().any(Schema::is_top),
            _ => false,
        }
    }

    pub fn as_array(&self) -> Option<&ArrTy> {
        match &self.ty { Ty::Array(arr) => Some(arr), _ => None }
    }

    /// Same structure with every annotation removed.
    pub fn stripped(&self) -> Schema {
        let ty = match &self.ty {
            Ty::Array(arr) => Ty::Array(ArrTy {
                items: match &arr.items {
                    Items::List(item) => Items::List(Box::new(item.stripped())),
                    Items::Tuple(cols) => Items::Tuple(cols.iter().map(Schema::stripped).collect()),
                },
                min_items: arr.min_items,
                max_items: arr.max_items,
                min_stated: arr.min_stated,
            }),
            Ty::Object(obj) => Ty::Object(ObjTy {
                properties: obj.properties.iter().map(|(k, v)| (k.clone(), v.stripped())).collect(),
                required: obj.required.clone(),
                additional_properties: obj.additional_properties,
            }),
            Ty::AnyOf(alts) => Ty::AnyOf(alts.iter().map(Schema::stripped).collect()),
            other => other.clone(),
        };
        ty.into()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = serde_json::to_value(self).map_err(|_| fmt::Error)?;
        write!(f, "{value}")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ARRAYS
// ————————————————————————————————————————————————————————————————————————————

impl Items {
    /// Every item schema, in position order (a list has exactly one).
    pub fn as_slice(&self) -> &[Schema] {
        match self {
            Items::List(item) => std::slice::from_ref(item.as_ref()),
            Items::Tuple(cols) => cols,
        }
    }
}

impl ArrTy {
    /// Schema constraining position `k`, or `None` when no instance can
    /// have that position.
    pub fn item_at(&self, k: u64) -> Option<&Schema> {
        if Bound::Finite(k) >= self.max_items {
            return None;
        }
        match &self.items {
            Items::List(item) => Some(item),
            Items::Tuple(cols) => usize::try_from(k).ok().and_then(|k| cols.get(k)),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LITERALS
// ————————————————————————————————————————————————————————————————————————————

impl Literal {
    pub fn number(n: f64) -> Self { Literal::Number(OrderedFloat(n)) }

    pub fn kind(&self) -> LitKind {
        match self {
            Literal::Null => LitKind::Null,
            Literal::Bool(_) => LitKind::Bool,
            Literal::Number(_) => LitKind::Number,
            Literal::String(_) => LitKind::String,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Literal::Number(n) if n.0.is_finite() && n.0.fract() == 0.0)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => json_num_pref_i64(n.0),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self { Literal::Bool(b) }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self { Literal::number(n) }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self { Literal::String(s.to_string()) }
}

// Helper: prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATIONS
// ————————————————————————————————————————————————————————————————————————————

impl Annotations {
    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }
    pub fn insert(&mut self, key: impl Into<String>, value: Value) { self.0.insert(key.into(), value); }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> { self.0.iter() }
    pub fn into_inner(self) -> IndexMap<String, Value> { self.0 }
}

impl From<IndexMap<String, Value>> for Annotations {
    fn from(map: IndexMap<String, Value>) -> Self { Self(map) }
}

impl PartialEq for Annotations {
    fn eq(&self, _: &Self) -> bool { true }
}

impl Eq for Annotations {}

impl PartialOrd for Annotations {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Annotations {
    fn cmp(&self, _: &Self) -> Ordering { Ordering::Equal }
}

impl Hash for Annotations {
    fn hash<H: Hasher>(&self, _: &mut H) {}
}

impl PartialEq for Stated {
    fn eq(&self, _: &Self) -> bool { true }
}

impl Eq for Stated {}

impl PartialOrd for Stated {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Stated {
    fn cmp(&self, _: &Self) -> Ordering { Ordering::Equal }
}

impl Hash for Stated {
    fn hash<H: Hasher>(&self, _: &mut H) {}
}
