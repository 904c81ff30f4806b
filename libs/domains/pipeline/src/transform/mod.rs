//! Pure row-to-datapoint transformation steps.
//!
//! Everything in this module is deterministic and side-effect free; the
//! service layer wires these steps between the warehouse, the embedding
//! provider, object storage and the vector index.

pub mod attributes;
pub mod datapoint;
pub mod filters;
pub mod normalize;
pub mod results;
pub mod text;

pub use attributes::{build_metadata, build_numeric_restricts, build_restricts, to_epoch_seconds};
pub use datapoint::{assemble_datapoints, datapoint_id, AttributeColumns};
pub use filters::translate_filters;
pub use normalize::{l2_normalize, l2_normalize_batch};
pub use results::reconstruct_result;
pub use text::{compose_text, default_text_columns};
