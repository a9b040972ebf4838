//! Schema algebra for type-checking data pipelines: a JSON-Schema-like
//! model with join (⊔), subschema (⊑), well-formedness checks, and shape
//! inference for column-wise concatenation.
pub mod algebra;
pub mod bound;
pub mod cli;
pub mod document;
pub mod error;
pub mod ir;
pub mod jq_exec;
pub mod ops;
pub mod path_de;
pub mod shape;
pub mod validate;

pub use algebra::{is_subschema, join, join_all};
pub use bound::{add_ranges, Bound, ColumnRange};
pub use error::SchemaError;
pub use ir::{Literal, Schema, Ty};
pub use ops::{accepts, Capability, ConcatFeatures, Operator};
pub use shape::infer_combined_shape;
pub use validate::{validate, SchemaPath};
