use std::cmp::Ordering;

use crate::bound::Bound;
use crate::ir::{ArrTy, Items, Schema, Stated, Ty};

use super::{is_subschema, join};

impl ArrTy {
    pub(super) fn join(a: &Self, b: &Self) -> Ty {
        let min_items = a.min_items.min(b.min_items);
        let max_items = a.max_items.max(b.max_items);
        // the lower bound keeps the provenance of the side it came from
        let min_stated = match a.min_items.cmp(&b.min_items) {
            Ordering::Less => a.min_stated,
            Ordering::Greater => b.min_stated,
            Ordering::Equal => Stated(a.min_stated.0 || b.min_stated.0),
        };

        let items = match (&a.items, &b.items) {
            (Items::List(x), Items::List(y)) => Items::List(Box::new(join(x, y))),
            // same-width rows stay rows, position by position
            (Items::Tuple(xs), Items::Tuple(ys)) if xs.len() == ys.len() => {
                Items::Tuple(xs.iter().zip(ys).map(|(x, y)| join(x, y)).collect())
            }
            // otherwise pool every item schema into one list hypothesis
            _ => Items::List(Box::new(pooled(a.items.as_slice().iter().chain(b.items.as_slice())))),
        };

        Ty::Array(ArrTy { items, min_items, max_items, min_stated })
    }

    pub(super) fn is_sub(a: &Self, b: &Self) -> bool {
        if a.min_items < b.min_items || a.max_items > b.max_items {
            return false;
        }
        match (&a.items, &b.items) {
            (Items::List(x), Items::List(y)) => a.max_items == Bound::Finite(0) || is_subschema(x, y),
            _ => {
                // bounds above make `a.max_items` concrete whenever a row is involved
                let Some(width) = a.max_items.finite() else { return false };
                (0..width).all(|k| match (a.item_at(k), b.item_at(k)) {
                    (Some(x), Some(y)) => is_subschema(x, y),
                    (None, _) => true,
                    (Some(_), None) => false,
                })
            }
        }
    }
}

/// Join of a bag of item schemas, folded in canonical order so the result
/// does not depend on which operand contributed what.
fn pooled<'a, I>(schemas: I) -> Schema
where
    I: Iterator<Item = &'a Schema>,
{
    let mut all: Vec<&Schema> = schemas.collect();
    all.sort();
    all.dedup();
    super::join_all(all).unwrap_or_else(Schema::any)
}
