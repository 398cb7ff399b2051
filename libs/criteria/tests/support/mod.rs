pub mod assertions;
pub mod fixtures;

use serde_json::Value;
use venture_criteria::{BuilderOptions, Condition, CriteriaBuilder};

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;

/// Build a condition over `BswPersonas` from a JSON object of filters.
pub fn build(filters_json: Value) -> venture_criteria::Result<Condition> {
    build_with(BuilderOptions::default(), filters_json)
}

pub fn build_with(options: BuilderOptions, filters_json: Value) -> venture_criteria::Result<Condition> {
    let schema = schema();
    let filters = filters(filters_json);
    CriteriaBuilder::with_options(&schema, options).build(PERSONAS, &filters)
}
