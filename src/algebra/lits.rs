use std::collections::BTreeSet;

use crate::ir::{LitKind, Literal, Ty};

/// Narrowest plain scalar admitting every literal, if there is one.
pub fn common_scalar<'a, I>(lits: I) -> Option<Ty>
where
    I: IntoIterator<Item = &'a Literal>,
{
    let mut out: Option<Ty> = None;
    for lit in lits {
        let ty = match lit {
            Literal::Null => return None,
            Literal::Bool(_) => Ty::Boolean,
            Literal::String(_) => Ty::String,
            Literal::Number(_) if lit.is_integral() => Ty::Integer,
            Literal::Number(_) => Ty::Number,
        };
        out = Some(match out {
            None => ty,
            Some(prev) => join_scalar(&prev, &ty)?,
        });
    }
    out
}

/// Whether scalar `ty` admits `lit`.
pub fn admits(ty: &Ty, lit: &Literal) -> bool {
    match (ty, lit) {
        (Ty::Number, Literal::Number(_)) => true,
        (Ty::Integer, Literal::Number(_)) => lit.is_integral(),
        (Ty::Boolean, Literal::Bool(_)) => true,
        (Ty::String, Literal::String(_)) => true,
        _ => false,
    }
}

fn join_scalar(a: &Ty, b: &Ty) -> Option<Ty> {
    match (a, b) {
        (Ty::Integer, Ty::Integer) => Some(Ty::Integer),
        (Ty::Integer | Ty::Number, Ty::Integer | Ty::Number) => Some(Ty::Number),
        (Ty::Boolean, Ty::Boolean) => Some(Ty::Boolean),
        (Ty::String, Ty::String) => Some(Ty::String),
        _ => None,
    }
}

fn kinds(lits: &[Literal]) -> BTreeSet<LitKind> {
    lits.iter().map(Literal::kind).collect()
}

fn join_enums(xs: &[Literal], ys: &[Literal]) -> Ty {
    let union: BTreeSet<&Literal> = xs.iter().chain(ys).collect();
    if kinds(xs) == kinds(ys) && union.len() <= super::MAX_ENUM_LITS {
        return Ty::Enum(union.into_iter().cloned().collect());
    }
    // cap: widen to the scalar type the literals share
    common_scalar(union).unwrap_or(Ty::Any)
}

/// Join of two non-container heads. Mismatched kinds widen to `Any`.
pub fn join(a: &Ty, b: &Ty) -> Ty {
    let joined = match (a, b) {
        (Ty::Enum(xs), Ty::Enum(ys)) => Some(join_enums(xs, ys)),
        (Ty::Enum(xs), other) | (other, Ty::Enum(xs)) => {
            common_scalar(xs).and_then(|c| join_scalar(&c, other))
        }
        _ => join_scalar(a, b),
    };
    joined.unwrap_or(Ty::Any)
}

pub fn is_sub(a: &Ty, b: &Ty) -> bool {
    match (a, b) {
        (Ty::Enum(xs), Ty::Enum(ys)) => xs.iter().all(|x| ys.contains(x)),
        (Ty::Enum(xs), scalar) => xs.iter().all(|x| admits(scalar, x)),
        // no implicit widening of a scalar into an enumeration
        (_, Ty::Enum(_)) => false,
        (Ty::Integer, Ty::Number) => true,
        (Ty::Number, Ty::Number)
        | (Ty::Integer, Ty::Integer)
        | (Ty::Boolean, Ty::Boolean)
        | (Ty::String, Ty::String) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra;
    use crate::ir::Schema;

    fn lits<const N: usize>(xs: [Literal; N]) -> Schema {
        Schema::enumeration(xs)
    }

    #[test]
    fn same_kind_enums_union() {
        let a = lits([Literal::from("mean"), Literal::from("median")]);
        let b = lits([Literal::from("most_frequent"), Literal::from("mean")]);
        assert_eq!(
            algebra::join(&a, &b),
            lits([Literal::from("mean"), Literal::from("median"), Literal::from("most_frequent")])
        );
    }

    #[test]
    fn mixed_kind_enums_fall_back() {
        let a = lits([Literal::number(1.0), Literal::number(2.0)]);
        let b = lits([Literal::number(0.5)]);
        assert_eq!(algebra::join(&a, &b), lits([Literal::number(0.5), Literal::number(1.0), Literal::number(2.0)]));

        let c = lits([Literal::from("auto")]);
        assert_eq!(algebra::join(&a, &c), Schema::any());
    }

    #[test]
    fn oversized_union_widens_to_its_scalar() {
        let a = Schema::enumeration((0..40).map(|i| Literal::number(f64::from(i))));
        let b = Schema::enumeration((40..80).map(|i| Literal::number(f64::from(i))));
        assert_eq!(algebra::join(&a, &b), Schema::integer());

        let c = Schema::enumeration((0..70).map(|i| Literal::String(format!("s{i}"))));
        let d = lits([Literal::from("t")]);
        assert_eq!(algebra::join(&c, &d), Schema::string());
    }

    #[test]
    fn enum_against_scalar() {
        let flags = lits([Literal::Bool(true)]);
        assert!(algebra::is_subschema(&flags, &Schema::boolean()));
        assert!(!algebra::is_subschema(&Schema::boolean(), &lits([Literal::Bool(true), Literal::Bool(false)])));
        assert_eq!(algebra::join(&flags, &Schema::boolean()), Schema::boolean());

        let halves = lits([Literal::number(0.5)]);
        assert!(!algebra::is_subschema(&halves, &Schema::integer()));
        assert_eq!(algebra::join(&halves, &Schema::integer()), Schema::number());
        assert_eq!(algebra::join(&lits([Literal::Null]), &Schema::number()), Schema::any());
    }

    #[test]
    fn integers_are_numbers() {
        assert!(algebra::is_subschema(&Schema::integer(), &Schema::number()));
        assert!(!algebra::is_subschema(&Schema::number(), &Schema::integer()));
        assert_eq!(algebra::join(&Schema::integer(), &Schema::number()), Schema::number());
        assert!(!algebra::is_subschema(&Schema::number(), &Schema::string()));
    }

    #[test]
    fn common_scalar_of_literals() {
        let xs = [Literal::number(1.0), Literal::number(2.5)];
        assert_eq!(common_scalar(&xs), Some(Ty::Number));
        assert_eq!(common_scalar(&[Literal::number(1.0)]), Some(Ty::Integer));
        assert_eq!(common_scalar(&[Literal::Null]), None);
        assert_eq!(common_scalar(&[Literal::Bool(true), Literal::from("x")]), None);
    }
}
