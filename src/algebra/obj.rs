use std::collections::BTreeMap;

use crate::ir::{ObjTy, Schema, Ty};

use super::{is_subschema, join};

impl ObjTy {
    pub(super) fn join(a: &Self, b: &Self) -> Ty {
        let mut properties = BTreeMap::new();

        // merge keys from a
        for (k, pa) in &a.properties {
            let ty = match b.properties.get(k) {
                Some(pb) => join(pa, pb),
                None => Schema::any(),
            };
            properties.insert(k.clone(), ty);
        }
        // add keys only in b
        for k in b.properties.keys() {
            if !properties.contains_key(k) {
                properties.insert(k.clone(), Schema::any());
            }
        }

        // a key required only on one side is no longer required
        let required = a.required.intersection(&b.required).cloned().collect();

        Ty::Object(ObjTy {
            properties,
            required,
            additional_properties: a.additional_properties || b.additional_properties,
        })
    }

    pub(super) fn is_sub(a: &Self, b: &Self) -> bool {
        if !b.required.is_subset(&a.required) {
            return false;
        }
        let declared = b.properties.iter().all(|(k, pb)| match a.properties.get(k) {
            Some(pa) => is_subschema(pa, pb),
            // absent from `a`: it either never occurs or can be anything
            None => !a.additional_properties || pb.is_top(),
        });
        let closed = b.additional_properties
            || (!a.additional_properties && a.properties.keys().all(|k| b.properties.contains_key(k)));
        declared && closed
    }
}

#[cfg(test)]
mod tests {
    use crate::algebra::{is_subschema, join};
    use crate::ir::Schema;

    fn n() -> Schema { Schema::number() }
    fn s() -> Schema { Schema::string() }

    #[test]
    fn join_unions_keys_and_intersects_required() {
        let a = Schema::object([("x", n()), ("y", s())], ["x", "y"], false);
        let b = Schema::object([("x", Schema::integer()), ("z", n())], ["x", "z"], false);
        assert_eq!(
            join(&a, &b),
            Schema::object([("x", n()), ("y", Schema::any()), ("z", Schema::any())], ["x"], false)
        );
    }

    #[test]
    fn additional_properties_open_up_on_join() {
        let a = Schema::object([("x", n())], ["x"], false);
        let b = Schema::object([("x", s())], ["x"], true);
        assert_eq!(join(&a, &b), Schema::object([("x", Schema::any())], ["x"], true));
    }

    #[test]
    fn fewer_requirements_is_wider() {
        let strict = Schema::object([("x", n()), ("y", n())], ["x", "y"], true);
        let loose = Schema::object([("x", n()), ("y", n())], ["x"], true);
        assert!(is_subschema(&strict, &loose));
        assert!(!is_subschema(&loose, &strict));
    }

    #[test]
    fn closed_target_rejects_open_source() {
        let open = Schema::object([("x", n())], ["x"], true);
        let closed = Schema::object([("x", n())], ["x"], false);
        assert!(is_subschema(&closed, &open));
        assert!(!is_subschema(&open, &closed));

        let wider = Schema::object([("x", n()), ("y", s())], ["x"], false);
        assert!(is_subschema(&closed, &wider));
        assert!(!is_subschema(&wider, &closed));
    }

    #[test]
    fn properties_missing_from_the_source() {
        let closed = Schema::object([("x", n())], ["x"], false);
        let open = Schema::object([("x", n())], ["x"], true);
        let target = Schema::object([("x", n()), ("y", s())], ["x"], true);
        // a closed source never carries `y`
        assert!(is_subschema(&closed, &target));
        // an open one might, with any value
        assert!(!is_subschema(&open, &target));
        let anything = Schema::object([("x", n()), ("y", Schema::any())], ["x"], true);
        assert!(is_subschema(&open, &anything));
    }

    #[test]
    fn required_only_on_the_missing_side_is_dropped() {
        let a = Schema::object([("x", n())], ["x"], true);
        let b = Schema::object([("y", n())], ["y"], true);
        let j = join(&a, &b);
        assert_eq!(j, Schema::object([("x", Schema::any()), ("y", Schema::any())], Vec::<&str>::new(), true));
        assert!(is_subschema(&a, &j));
        assert!(is_subschema(&b, &j));
    }
}
