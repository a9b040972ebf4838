//! Well-formedness checks for schemas handed to the engine from outside.
use std::fmt;

use crate::error::SchemaError;
use crate::ir::{Items, Schema, Ty};
use crate::bound::Bound;

/// Location of a node inside a schema, rendered as `#/properties/X/items/0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath(Vec<Segment>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl SchemaPath {
    pub fn root() -> Self { Self::default() }

    pub fn segments(&self) -> &[Segment] { &self.0 }

    pub fn push(&mut self, segment: impl Into<Segment>) { self.0.push(segment.into()); }

    pub fn pop(&mut self) { self.0.pop(); }

    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut out = self.clone();
        out.push(segment);
        out
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self { Segment::Key(key.to_string()) }
}

impl From<String> for Segment {
    fn from(key: String) -> Self { Segment::Key(key) }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self { Segment::Index(index) }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for segment in &self.0 {
            match segment {
                // JSON Pointer escaping
                Segment::Key(k) => write!(f, "/{}", k.replace('~', "~0").replace('/', "~1"))?,
                Segment::Index(i) => write!(f, "/{i}")?,
            }
        }
        Ok(())
    }
}

/// Check the structural invariants of `schema`, reporting the first violation.
pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
    match diagnose(schema).into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Every structural violation in `schema`, in depth-first order.
pub fn diagnose(schema: &Schema) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    walk(schema, &mut SchemaPath::root(), &mut errors);
    errors
}

fn walk(schema: &Schema, path: &mut SchemaPath, errors: &mut Vec<SchemaError>) {
    match &schema.ty {
        Ty::Any | Ty::Number | Ty::Integer | Ty::Boolean | Ty::String => {}
        Ty::Enum(values) => {
            if values.is_empty() {
                errors.push(SchemaError::malformed(path, "enum must list at least one value"));
            }
        }
        Ty::AnyOf(alts) => {
            if alts.is_empty() {
                errors.push(SchemaError::malformed(path, "anyOf must list at least one alternative"));
            }
            path.push("anyOf");
            for (i, alt) in alts.iter().enumerate() {
                path.push(i);
                walk(alt, path, errors);
                path.pop();
            }
            path.pop();
        }
        Ty::Array(arr) => {
            if Bound::Finite(arr.min_items) > arr.max_items {
                errors.push(SchemaError::malformed(
                    path,
                    format!("minItems {} exceeds maxItems {}", arr.min_items, arr.max_items),
                ));
            }
            path.push("items");
            match &arr.items {
                Items::List(item) => walk(item, path, errors),
                Items::Tuple(cols) => {
                    let width = cols.len() as u64;
                    if arr.max_items != Bound::Finite(width) {
                        path.pop();
                        errors.push(SchemaError::malformed(
                            path,
                            format!("a row of {width} positions must declare maxItems {width}, found {}", arr.max_items),
                        ));
                        path.push("items");
                    }
                    for (i, col) in cols.iter().enumerate() {
                        path.push(i);
                        walk(col, path, errors);
                        path.pop();
                    }
                }
            }
            path.pop();
        }
        Ty::Object(obj) => {
            for name in obj.required.iter().filter(|k| !obj.properties.contains_key(*k)) {
                errors.push(SchemaError::malformed(
                    path,
                    format!("required property `{name}` is not declared in properties"),
                ));
            }
            path.push("properties");
            for (name, prop) in &obj.properties {
                path.push(name.as_str());
                walk(prop, path, errors);
                path.pop();
            }
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArrTy, Stated};

    #[test]
    fn well_formed_schemas_pass() {
        let s = Schema::object(
            [("X", Schema::list(Schema::tuple([Schema::number(), Schema::string()])))],
            ["X"],
            false,
        );
        assert_eq!(validate(&s), Ok(()));
    }

    #[test]
    fn required_name_missing_from_properties_points_at_the_object() {
        let inner = Schema::object([("a", Schema::number())], ["a", "b"], true);
        let outer = Schema::object([("cfg", inner)], Vec::<&str>::new(), true);
        let err = validate(&outer).unwrap_err();
        let SchemaError::Malformed(path, reason) = err else { panic!("expected Malformed") };
        assert_eq!(path.to_string(), "#/properties/cfg");
        assert!(reason.contains("`b`"));
    }

    #[test]
    fn empty_enum_and_union_are_rejected() {
        let s = Schema::any_of([Schema::enumeration([])]);
        let errors = diagnose(&s);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().unwrap().to_string(), "#/anyOf/0");

        let errors = diagnose(&Schema::any_of([]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().unwrap().to_string(), "#");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let s = Schema::list(Schema::array(Schema::number(), 4, 2u64));
        let err = validate(&s).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "#/items");
        assert!(err.to_string().contains("minItems 4 exceeds maxItems 2"));
    }

    #[test]
    fn row_width_must_match_its_maximum() {
        let s: Schema = Ty::Array(ArrTy {
            items: Items::Tuple(vec![Schema::number(), Schema::number()]),
            min_items: 1,
            max_items: Bound::Unbounded,
            min_stated: Stated(true),
        }).into();
        let errors = diagnose(&s);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path().unwrap().to_string(), "#");
    }

    #[test]
    fn diagnose_collects_every_violation() {
        let s = Schema::tuple([
            Schema::enumeration([]),
            Schema::object(Vec::<(&str, Schema)>::new(), ["x"], true),
        ]);
        let paths: Vec<String> = diagnose(&s).iter().map(|e| e.path().unwrap().to_string()).collect();
        assert_eq!(paths, vec!["#/items/0", "#/items/1"]);
    }

    #[test]
    fn pointer_segments_are_escaped() {
        let path = SchemaPath::root().child("properties").child("a/b~c");
        assert_eq!(path.to_string(), "#/properties/a~1b~0c");
    }
}
