//! Shape inference for column-wise concatenation.
//!
//! Each input is the schema of one dataset: an outer array over samples
//! whose items describe a row. Rows are combined side by side, so column
//! counts add up (range arithmetic) and column types join.
use once_cell::sync::Lazy;
use tracing::debug;

use crate::algebra::{is_subschema, join, join_all};
use crate::bound::{Bound, ColumnRange};
use crate::ir::{Items, Schema, Ty};

/// `anyOf[1-d numeric, 2-d numeric]`: a dataset general enough to take
/// either shape is read as the 2-d one.
static EITHER_NUMERIC_SHAPE: Lazy<Schema> = Lazy::new(|| {
    Schema::any_of([Schema::list(Schema::number()), numeric_matrix()])
});

fn numeric_matrix() -> Schema {
    Schema::list(Schema::list(Schema::number()))
}

/// What one dataset adds to the combined row.
#[derive(Debug, Clone)]
struct Contribution {
    cols: ColumnRange,
    elem: Schema,
}

/// Combined schema of concatenating `inputs` column-wise, in input order.
///
/// Never fails: an input that is opaque along the samples → features
/// descent makes the whole result `Any`.
pub fn infer_combined_shape<'a, I>(inputs: I) -> Schema
where
    I: IntoIterator<Item = &'a Schema>,
{
    let mut cols = ColumnRange::ZERO;
    let mut elem: Option<Schema> = None;

    for (i, dataset) in inputs.into_iter().enumerate() {
        let Some(part) = contribution(dataset) else {
            debug!(input = i, "dataset shape is opaque; combined shape degrades to any");
            return Schema::any();
        };
        debug!(input = i, cols = %part.cols, "dataset contributes columns");
        cols = cols + part.cols;
        elem = Some(match elem {
            None => part.elem,
            Some(acc) => join(&acc, &part.elem),
        });
    }

    let row = Schema::array(elem.unwrap_or_else(Schema::any), cols.min, cols.max);
    Schema::list(row)
}

fn contribution(dataset: &Schema) -> Option<Contribution> {
    if dataset.is_top() {
        return None;
    }
    let matrix;
    let dataset = if is_subschema(&EITHER_NUMERIC_SHAPE, dataset) {
        matrix = numeric_matrix();
        &matrix
    } else {
        dataset
    };

    // samples dimension
    let samples = dataset.as_array()?;
    let rows = match &samples.items {
        Items::List(row) => row.as_ref().clone(),
        Items::Tuple(rows) => join_all(rows)?,
    };
    if rows.is_top() {
        return None;
    }

    // features dimension
    let part = match &rows.ty {
        Ty::Array(row) => match &row.items {
            // fixed-width row, possibly with an optional tail
            Items::Tuple(cells) => Contribution {
                cols: ColumnRange::new(row.min_items, cells.len() as u64),
                elem: join_all(cells).unwrap_or_else(Schema::any),
            },
            // an unstated lower bound counts as one column
            Items::List(cell) => Contribution {
                cols: ColumnRange::new(
                    if row.min_stated.0 { row.min_items } else { row.min_items.max(1) },
                    row.max_items,
                ),
                elem: cell.stripped(),
            },
        },
        // a 1-d dataset is a single column
        _ => Contribution { cols: ColumnRange::exact(1), elem: rows.stripped() },
    };
    Some(part)
}

/// Maximum row width of a samples × features schema.
pub fn column_bound(schema: &Schema) -> Option<Bound> {
    let row = schema.as_array()?.items.as_slice().first()?;
    Some(row.as_array()?.max_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Literal;
    use serde_json::json;

    fn n() -> Schema { Schema::number() }

    fn dataset(row: Schema) -> Schema {
        Schema::list(row)
    }

    #[test]
    fn fixed_width_datasets_add_their_widths() {
        let three = dataset(Schema::tuple([n(), n(), n()]));
        let two = dataset(Schema::tuple([n(), n()]));
        let combined = infer_combined_shape([&three, &two]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 5, 5u64)));
    }

    #[test]
    fn open_ended_width_stays_open() {
        let open = dataset(Schema::array(n(), 1, Bound::Unbounded));
        let two = dataset(Schema::tuple([n(), n()]));
        let combined = infer_combined_shape([&open, &two]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 3, Bound::Unbounded)));
        assert_eq!(column_bound(&combined), Some(Bound::Unbounded));
    }

    #[test]
    fn column_types_join() {
        let ints = dataset(Schema::array(Schema::integer(), 2, 2u64));
        let mixed = dataset(Schema::tuple([Schema::integer(), n()]));
        let combined = infer_combined_shape([&ints, &mixed]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 4, 4u64)));

        let labels = dataset(Schema::tuple([Schema::enumeration([Literal::from("a")])]));
        let combined = infer_combined_shape([&ints, &labels]);
        assert_eq!(combined, Schema::list(Schema::array(Schema::any(), 3, 3u64)));
    }

    #[test]
    fn missing_lower_bound_counts_as_one_column() {
        let rows = dataset(Schema::list(n()));
        let combined = infer_combined_shape([&rows, &rows]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 2, Bound::Unbounded)));
    }

    #[test]
    fn explicit_zero_lower_bound_is_kept() {
        let maybe_empty = Schema::from_value(json!({
            "type": "array",
            "items": {"type": "array", "items": {"type": "number"}, "minItems": 0, "maxItems": 3}
        })).unwrap();
        let combined = infer_combined_shape([&maybe_empty]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 0, 3u64)));

        let empty_rows = Schema::list(Schema::array(n(), 0, 0u64));
        assert!(is_subschema(&empty_rows, &maybe_empty));
        assert!(is_subschema(&empty_rows, &combined));
    }

    #[test]
    fn optional_row_tail_widens_the_column_range() {
        let short_rows = Schema::from_value(json!({
            "type": "array",
            "items": {"type": "array", "items": [{"type": "number"}, {"type": "number"}], "minItems": 1}
        })).unwrap();
        let combined = infer_combined_shape([&short_rows]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 1, 2u64)));

        let one_col = Schema::list(Schema::tuple([n()]));
        assert!(is_subschema(&one_col, &short_rows));
        assert!(is_subschema(&one_col, &combined));
    }

    #[test]
    fn one_dimensional_datasets_are_single_columns() {
        let column = Schema::list(Schema::integer());
        let two = dataset(Schema::tuple([n(), n()]));
        let combined = infer_combined_shape([&column, &two]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 3, 3u64)));
    }

    #[test]
    fn opaque_inputs_degrade_to_any() {
        let two = dataset(Schema::tuple([n(), n()]));
        assert_eq!(infer_combined_shape([&two, &Schema::any()]), Schema::any());
        assert_eq!(infer_combined_shape([&dataset(Schema::any()), &two]), Schema::any());
        assert_eq!(infer_combined_shape([&Schema::string(), &two]), Schema::any());
    }

    #[test]
    fn either_numeric_shape_reads_as_a_matrix() {
        let either = Schema::any_of([Schema::list(n()), Schema::list(Schema::list(n()))]);
        let two = dataset(Schema::tuple([n(), n()]));
        let combined = infer_combined_shape([&either, &two]);
        assert_eq!(combined, Schema::list(Schema::array(n(), 3, Bound::Unbounded)));
    }

    #[test]
    fn input_order_does_not_change_the_result() {
        let a = dataset(Schema::array(Schema::integer(), 1, 4u64));
        let b = dataset(Schema::tuple([n(), Schema::integer()]));
        let c = dataset(Schema::array(n(), 2, Bound::Unbounded));
        assert_eq!(infer_combined_shape([&a, &b, &c]), infer_combined_shape([&c, &a, &b]));
    }

    #[test]
    fn no_inputs_yield_an_empty_row() {
        let none: [&Schema; 0] = [];
        assert_eq!(infer_combined_shape(none), Schema::list(Schema::array(Schema::any(), 0, 0u64)));
    }

    #[test]
    fn documents_in_documents_out() {
        let a = Schema::from_value(json!({
            "description": "three named columns",
            "type": "array",
            "items": {"type": "array", "items": [{"type": "number"}, {"type": "number"}, {"type": "number"}]}
        })).unwrap();
        let b = Schema::from_value(json!({
            "type": "array",
            "items": {"type": "array", "minItems": 2, "maxItems": 2, "items": {"type": "number"}}
        })).unwrap();
        let out = infer_combined_shape([&a, &b]);
        assert_eq!(
            out.to_value(),
            json!({
                "type": "array",
                "items": {"type": "array", "items": {"type": "number"}, "minItems": 5, "maxItems": 5}
            })
        );
    }
}
