//! Operator contracts: what each capability of an operator consumes and
//! produces, expressed as schemas.
use std::fmt;

use tracing::debug;

use crate::algebra::is_subschema;
use crate::ir::{Items, Schema, Ty};
use crate::shape::infer_combined_shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Fit,
    Transform,
    Predict,
    PredictProba,
    DecisionFunction,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Fit => "fit",
            Capability::Transform => "transform",
            Capability::Predict => "predict",
            Capability::PredictProba => "predict_proba",
            Capability::DecisionFunction => "decision_function",
        };
        f.write_str(name)
    }
}

pub trait Operator {
    fn name(&self) -> &str;

    /// Declared input of `cap`, or `None` if the operator lacks it.
    fn input_schema(&self, cap: Capability) -> Option<Schema>;

    /// Declared output of `cap`, or `None` if the operator lacks it.
    fn output_schema(&self, cap: Capability) -> Option<Schema>;

    /// Output of `transform` for a concrete `X` schema. Operators whose
    /// output shape depends on their input override this.
    fn transform_schema(&self, _input: &Schema) -> Schema {
        self.output_schema(Capability::Transform).unwrap_or_else(Schema::any)
    }
}

/// Whether data produced under `producer_output` can be fed to a consumer
/// declaring `consumer_input`.
pub fn accepts(producer_output: &Schema, consumer_input: &Schema) -> bool {
    let ok = is_subschema(producer_output, consumer_input);
    if !ok {
        debug!(producer = %producer_output, consumer = %consumer_input, "incompatible schemas");
    }
    ok
}

// ------------------------------ ConcatFeatures ----------------------------- //

/// Horizontal stacking: concatenates the features (columns) of its input
/// datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatFeatures;

impl ConcatFeatures {
    fn datasets_schema() -> Schema {
        let features = Schema::any_of([Schema::list(Schema::number()), Schema::number()])
            .describe("Innermost array dimension is over features (aka columns).");
        let samples = Schema::list(features)
            .describe("Middle array dimension is over samples (aka rows).");
        Schema::list(samples).describe("Outermost array dimension is over datasets.")
    }

    fn features_schema() -> Schema {
        let row = Schema::list(
            Schema::number().describe("Inner array dimension is over features (aka columns)."),
        )
        .describe("Outer array dimension is over samples (aka rows).");
        Schema::list(row).describe("Features; the outer array is over samples.")
    }
}

impl Operator for ConcatFeatures {
    fn name(&self) -> &str {
        "ConcatFeatures"
    }

    fn input_schema(&self, cap: Capability) -> Option<Schema> {
        match cap {
            Capability::Transform => {
                Some(Schema::object([("X", Self::datasets_schema())], ["X"], false))
            }
            _ => None,
        }
    }

    fn output_schema(&self, cap: Capability) -> Option<Schema> {
        match cap {
            Capability::Transform => Some(Self::features_schema()),
            _ => None,
        }
    }

    /// `input` is the schema of `X`: one entry per dataset.
    fn transform_schema(&self, input: &Schema) -> Schema {
        match &input.ty {
            Ty::Array(arr) => match &arr.items {
                Items::Tuple(datasets) if arr.min_items == datasets.len() as u64 => {
                    infer_combined_shape(datasets)
                }
                _ => {
                    debug!(operator = self.name(), "number of datasets is unknown");
                    Schema::any()
                }
            },
            _ => Schema::any(),
        }
    }
}
