//! Schema documents: the JSON vocabulary exchanged with operators.
//!
//! Recognized keys are `type`, `items`, `minItems`, `maxItems`,
//! `properties`, `required`, `additionalProperties`, `enum` and `anyOf`.
//! Anything else rides along as annotations. `{"laleType": "Any"}`,
//! `{"type": "any"}` and a document with no recognized vocabulary all
//! read as the unconstrained schema; the first is what gets written.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bound::Bound;
use crate::error::SchemaError;
use crate::ir::{Annotations, ArrTy, Items, Literal, ObjTy, Schema, Stated, Ty};
use crate::validate::SchemaPath;

/// Serde image of one document node, before lowering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<RawItems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, RawSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<RawSchema>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Annotation key whose value `"Any"` marks the unconstrained schema.
const LALE_TYPE: &str = "laleType";

impl RawSchema {
    /// Whether any keyword other than `anyOf` is present.
    fn has_vocabulary(&self) -> bool {
        self.type_.is_some()
            || self.items.is_some()
            || self.min_items.is_some()
            || self.max_items.is_some()
            || self.properties.is_some()
            || self.required.is_some()
            || self.additional_properties.is_some()
            || self.enum_.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeField {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItems {
    One(Box<RawSchema>),
    Many(Vec<RawSchema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head { Any, Number, Integer, Boolean, String, Null, Array, Object }

impl Head {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "any" => Head::Any,
            "number" => Head::Number,
            "integer" => Head::Integer,
            "boolean" => Head::Boolean,
            "string" => Head::String,
            "null" => Head::Null,
            "array" => Head::Array,
            "object" => Head::Object,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Head::Any => "any",
            Head::Number => "number",
            Head::Integer => "integer",
            Head::Boolean => "boolean",
            Head::String => "string",
            Head::Null => "null",
            Head::Array => "array",
            Head::Object => "object",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Parse a document. Vocabulary misuse is reported as `Malformed`; the
    /// structural invariants are left to [`crate::validate::validate`].
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let raw = crate::path_de::from_value_with_path::<RawSchema>(value)?;
        Schema::try_from(raw)
    }

    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        let raw = crate::path_de::from_str_with_path::<RawSchema>(src)?;
        Schema::try_from(raw)
    }

    pub fn to_value(&self) -> Value {
        // every map in a RawSchema is keyed by strings, so this cannot fail
        serde_json::to_value(RawSchema::from(self)).expect("schema documents always serialize")
    }
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        lower(raw, &mut SchemaPath::root())
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        RawSchema::from(&schema)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERING: RawSchema -> Schema
// ————————————————————————————————————————————————————————————————————————————

fn lower(mut raw: RawSchema, path: &mut SchemaPath) -> Result<Schema, SchemaError> {
    if is_any_sentinel(&raw.extra) {
        raw.extra.shift_remove(LALE_TYPE);
        return Ok(Schema { ty: Ty::Any, annotations: Annotations::from(raw.extra) });
    }

    let Some(alts) = raw.any_of.take() else {
        return lower_plain(raw, path);
    };
    let extra = std::mem::take(&mut raw.extra);
    let alts = lower_each(alts, "anyOf", path)?;
    let ty = if raw.has_vocabulary() {
        // `anyOf` next to other keywords: both must hold
        let base = lower_plain(raw, path)?;
        narrow_alternatives(base, alts)
    } else {
        Ty::AnyOf(alts)
    };
    Ok(Schema { ty, annotations: Annotations::from(extra) })
}

/// `base ∧ anyOf(alts)`. Exact when every alternative already lies within
/// `base`; otherwise `base` itself, which contains the conjunction.
fn narrow_alternatives(base: Schema, alts: Vec<Schema>) -> Ty {
    if alts.iter().all(|alt| crate::algebra::is_subschema(alt, &base)) {
        Ty::AnyOf(alts)
    } else {
        base.ty
    }
}

fn is_any_sentinel(extra: &IndexMap<String, Value>) -> bool {
    extra.get(LALE_TYPE).and_then(Value::as_str) == Some("Any")
}

fn lower_plain(raw: RawSchema, path: &mut SchemaPath) -> Result<Schema, SchemaError> {
    let RawSchema {
        type_, items, min_items, max_items,
        properties, required, additional_properties,
        enum_, any_of: _, extra,
    } = raw;

    let array_kw = keyword_present([
        ("items", items.is_some()),
        ("minItems", min_items.is_some()),
        ("maxItems", max_items.is_some()),
    ]);
    let object_kw = keyword_present([
        ("properties", properties.is_some()),
        ("required", required.is_some()),
        ("additionalProperties", additional_properties.is_some()),
    ]);

    let ty = if let Some(values) = enum_ {
        if let Some(kw) = type_.as_ref().map(|_| "type").or(array_kw).or(object_kw) {
            return Err(SchemaError::malformed(path, format!("`enum` cannot be combined with `{kw}`")));
        }
        Ty::Enum(lower_literals(values, path)?)
    } else {
        let head = match type_ {
            None => match (array_kw, object_kw) {
                (Some(a), Some(o)) => {
                    return Err(SchemaError::malformed(path, format!("`{a}` and `{o}` describe different types")));
                }
                (Some(_), None) => Head::Array,
                (None, Some(_)) => Head::Object,
                (None, None) => Head::Any,
            },
            Some(TypeField::One(name)) => parse_head(&name, path)?,
            Some(TypeField::Many(names)) => {
                if let Some(kw) = array_kw.or(object_kw) {
                    return Err(SchemaError::malformed(path, format!("`{kw}` needs a single `type`")));
                }
                return Ok(Schema { ty: lower_type_list(&names, path)?, annotations: extra.into() });
            }
        };
        match head {
            Head::Array => {
                if let Some(kw) = object_kw {
                    return Err(SchemaError::malformed(path, format!("`{kw}` does not apply to type `array`")));
                }
                lower_array(items, min_items, max_items, path)?
            }
            Head::Object => {
                if let Some(kw) = array_kw {
                    return Err(SchemaError::malformed(path, format!("`{kw}` does not apply to type `object`")));
                }
                lower_object(properties, required, additional_properties, path)?
            }
            scalar => {
                if let Some(kw) = array_kw.or(object_kw) {
                    return Err(SchemaError::malformed(
                        path,
                        format!("`{kw}` does not apply to type `{}`", scalar.name()),
                    ));
                }
                scalar_ty(scalar)
            }
        }
    };

    Ok(Schema { ty, annotations: Annotations::from(extra) })
}

fn keyword_present<const N: usize>(flags: [(&'static str, bool); N]) -> Option<&'static str> {
    flags.into_iter().find(|(_, present)| *present).map(|(kw, _)| kw)
}

fn parse_head(name: &str, path: &SchemaPath) -> Result<Head, SchemaError> {
    Head::parse(name).ok_or_else(|| SchemaError::malformed(path, format!("unsupported type `{name}`")))
}

fn scalar_ty(head: Head) -> Ty {
    match head {
        Head::Any => Ty::Any,
        Head::Number => Ty::Number,
        Head::Integer => Ty::Integer,
        Head::Boolean => Ty::Boolean,
        Head::String => Ty::String,
        Head::Null => Ty::Enum(vec![Literal::Null]),
        Head::Array => Ty::Array(ArrTy {
            items: Items::List(Box::new(Schema::any())),
            min_items: 0,
            max_items: Bound::Unbounded,
            min_stated: Stated(false),
        }),
        Head::Object => Ty::Object(ObjTy { additional_properties: true, ..ObjTy::default() }),
    }
}

fn lower_type_list(names: &[String], path: &mut SchemaPath) -> Result<Ty, SchemaError> {
    path.push("type");
    let heads = names.iter().map(|n| parse_head(n, path)).collect::<Result<Vec<_>, _>>();
    path.pop();
    let mut heads = heads?;
    match heads.len() {
        0 => Err(SchemaError::malformed(path, "`type` lists no types")),
        1 => Ok(scalar_ty(heads.remove(0))),
        _ => Ok(Ty::AnyOf(heads.into_iter().map(|h| Schema::from(scalar_ty(h))).collect())),
    }
}

fn lower_each(raws: Vec<RawSchema>, key: &str, path: &mut SchemaPath) -> Result<Vec<Schema>, SchemaError> {
    path.push(key);
    let mut out = Vec::with_capacity(raws.len());
    for (i, raw) in raws.into_iter().enumerate() {
        path.push(i);
        out.push(lower(raw, path)?);
        path.pop();
    }
    path.pop();
    Ok(out)
}

fn lower_literals(values: Vec<Value>, path: &mut SchemaPath) -> Result<Vec<Literal>, SchemaError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            Literal::try_from(value).map_err(|reason| SchemaError::malformed(&path.child("enum").child(i), reason))
        })
        .collect()
}

fn lower_array(
    items: Option<RawItems>,
    min_items: Option<u64>,
    max_items: Option<u64>,
    path: &mut SchemaPath,
) -> Result<Ty, SchemaError> {
    let min_stated = Stated(min_items.is_some());
    let arr = match items {
        None => ArrTy {
            items: Items::List(Box::new(Schema::any())),
            min_items: min_items.unwrap_or(0),
            max_items: max_items.map_or(Bound::Unbounded, Bound::Finite),
            min_stated,
        },
        Some(RawItems::One(raw)) => {
            path.push("items");
            let item = lower(*raw, path)?;
            path.pop();
            ArrTy {
                items: Items::List(Box::new(item)),
                min_items: min_items.unwrap_or(0),
                max_items: max_items.map_or(Bound::Unbounded, Bound::Finite),
                min_stated,
            }
        }
        Some(RawItems::Many(raws)) => {
            let cols = lower_each(raws, "items", path)?;
            let width = cols.len() as u64;
            ArrTy {
                items: Items::Tuple(cols),
                min_items: min_items.unwrap_or(width),
                max_items: Bound::Finite(max_items.unwrap_or(width)),
                min_stated,
            }
        }
    };
    Ok(Ty::Array(arr))
}

fn lower_object(
    properties: Option<IndexMap<String, RawSchema>>,
    required: Option<Vec<String>>,
    additional_properties: Option<bool>,
    path: &mut SchemaPath,
) -> Result<Ty, SchemaError> {
    let mut obj = ObjTy {
        additional_properties: additional_properties.unwrap_or(true),
        required: required.unwrap_or_default().into_iter().collect(),
        ..ObjTy::default()
    };
    path.push("properties");
    for (name, raw) in properties.unwrap_or_default() {
        path.push(name.as_str());
        let prop = lower(raw, path)?;
        path.pop();
        obj.properties.insert(name, prop);
    }
    path.pop();
    Ok(Ty::Object(obj))
}

impl TryFrom<Value> for Literal {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Literal::Null),
            Value::Bool(b) => Ok(Literal::Bool(b)),
            Value::Number(n) => n
                .as_f64()
                .map(Literal::number)
                .ok_or_else(|| format!("number {n} is not representable")),
            Value::String(s) => Ok(Literal::String(s)),
            Value::Array(_) | Value::Object(_) => Err("enum entries must be literals".to_string()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMISSION: Schema -> RawSchema
// ————————————————————————————————————————————————————————————————————————————

impl From<&Schema> for RawSchema {
    fn from(schema: &Schema) -> Self {
        let mut raw = RawSchema {
            extra: schema.annotations.clone().into_inner(),
            ..RawSchema::default()
        };
        let type_name = |name: &str| Some(TypeField::One(name.to_string()));
        match &schema.ty {
            Ty::Any => {
                raw.extra.insert(LALE_TYPE.to_string(), Value::String("Any".to_string()));
            }
            Ty::Number => raw.type_ = type_name("number"),
            Ty::Integer => raw.type_ = type_name("integer"),
            Ty::Boolean => raw.type_ = type_name("boolean"),
            Ty::String => raw.type_ = type_name("string"),
            Ty::Enum(values) => raw.enum_ = Some(values.iter().map(Literal::to_value).collect()),
            Ty::AnyOf(alts) => raw.any_of = Some(alts.iter().map(RawSchema::from).collect()),
            Ty::Array(arr) => {
                raw.type_ = type_name("array");
                match &arr.items {
                    Items::List(item) => {
                        raw.items = Some(RawItems::One(Box::new(RawSchema::from(item.as_ref()))));
                        raw.min_items = (arr.min_stated.0 || arr.min_items > 0).then_some(arr.min_items);
                        raw.max_items = arr.max_items.finite();
                    }
                    // rows always spell out their width
                    Items::Tuple(cols) => {
                        raw.items = Some(RawItems::Many(cols.iter().map(RawSchema::from).collect()));
                        raw.min_items = Some(arr.min_items);
                        raw.max_items = arr.max_items.finite();
                    }
                }
            }
            Ty::Object(obj) => {
                raw.type_ = type_name("object");
                raw.properties = Some(obj.properties.iter().map(|(k, v)| (k.clone(), RawSchema::from(v))).collect());
                if !obj.required.is_empty() {
                    raw.required = Some(obj.required.iter().cloned().collect());
                }
                if !obj.additional_properties {
                    raw.additional_properties = Some(false);
                }
            }
        }
        raw
    }
}
