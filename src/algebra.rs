//! Schema algebra: join (⊔) and the subschema order (⊑).
//!
//! `a ⊑ b` means every instance of `a` is an instance of `b`. `a ⊔ b` is an
//! upper bound of both operands under that same order; when no precise
//! bound exists in the vocabulary it widens to `Any` instead of failing.
//!
//! Laws (checked by the property tests below):
//! - ⊑ is reflexive and transitive, with `Any` on top.
//! - `a ⊑ a ⊔ b` and `b ⊑ a ⊔ b`.
//! - ⊔ is commutative up to structural equality.
//!
//! Results never carry annotations.
pub mod lits;
mod arr;
mod obj;

use tracing::trace;

use crate::ir::{ArrTy, ObjTy, Schema, Ty};

// ------------------------------- Policy ---------------------------------- //

/// Enum unions larger than this widen to their common scalar type.
pub const MAX_ENUM_LITS: usize = 64;

// -------------------------------- Join (⊔) -------------------------------- //

pub fn join(a: &Schema, b: &Schema) -> Schema {
    if a.is_top() || b.is_top() {
        return Schema::any();
    }

    // one side already covers the other
    match (is_subschema(a, b), is_subschema(b, a)) {
        (true, true) => return std::cmp::max(a, b).stripped(),
        (true, false) => return b.stripped(),
        (false, true) => return a.stripped(),
        (false, false) => {}
    }

    let ty = match (&a.ty, &b.ty) {
        (Ty::AnyOf(xs), Ty::AnyOf(ys)) => {
            return join_alternatives(xs.iter().flat_map(|x| ys.iter().map(move |y| join(x, y))));
        }
        (Ty::AnyOf(xs), _) => return join_alternatives(xs.iter().map(|x| join(x, b))),
        (_, Ty::AnyOf(ys)) => return join_alternatives(ys.iter().map(|y| join(a, y))),
        (Ty::Array(x), Ty::Array(y)) => ArrTy::join(x, y),
        (Ty::Object(x), Ty::Object(y)) => ObjTy::join(x, y),
        (x, y) => lits::join(x, y),
    };
    if ty == Ty::Any {
        trace!(left = %a, right = %b, "join widened to any");
    }
    ty.into()
}

/// Join of every schema in `schemas`, or `None` when there are none.
pub fn join_all<'a, I>(schemas: I) -> Option<Schema>
where
    I: IntoIterator<Item = &'a Schema>,
{
    let mut it = schemas.into_iter();
    let first = it.next()?.stripped();
    Some(it.fold(first, |acc, s| join(&acc, s)))
}

/// Re-collect joined alternatives into a canonical union: nested unions are
/// flattened, duplicates removed, and a single survivor is returned as is.
fn join_alternatives<I: IntoIterator<Item = Schema>>(alts: I) -> Schema {
    let mut out: Vec<Schema> = Vec::new();
    for alt in alts {
        match alt {
            Schema { ty: Ty::Any, .. } => return Schema::any(),
            Schema { ty: Ty::AnyOf(inner), .. } => out.extend(inner),
            alt => out.push(alt),
        }
    }
    if out.iter().any(Schema::is_top) {
        return Schema::any();
    }
    out.sort();
    out.dedup();
    match out.len() {
        0 => Schema::any(),
        1 => out.remove(0),
        _ => Schema::any_of(out),
    }
}

// ------------------------------ Subschema (⊑) ----------------------------- //

pub fn is_subschema(a: &Schema, b: &Schema) -> bool {
    match (&a.ty, &b.ty) {
        (_, Ty::Any) => true,
        (Ty::AnyOf(xs), _) => xs.iter().all(|x| is_subschema(x, b)),
        (Ty::Any, _) => b.is_top(),
        (_, Ty::AnyOf(ys)) => ys.iter().any(|y| is_subschema(a, y)),
        (Ty::Array(x), Ty::Array(y)) => ArrTy::is_sub(x, y),
        (Ty::Object(x), Ty::Object(y)) => ObjTy::is_sub(x, y),
        (x, y) => lits::is_sub(x, y),
    }
}

// ------------------------------- Tests ------------------------------------ //
