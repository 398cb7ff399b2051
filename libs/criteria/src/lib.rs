//! Venture Criteria - dynamic predicate builder
//!
//! Turns an untyped filter mapping (`operator:path` keys to raw values) into a
//! typed condition tree over an entity graph:
//!
//! ```text
//! FilterMap
//!      |
//!   Key Parser -> (operator, path expressions)
//!      |
//!   Path Resolver -> AttributePath (left joins + typed attribute)
//!      |
//!   Value Coercion -> Scalar
//!      |
//!   Condition Assembler -> Condition
//!      |
//!   Tree Composer -> AND of all conditions (or TRUE)
//! ```
//!
//! The tree can be evaluated in memory against JSON records ([`Condition::matches`])
//! or rendered as parameterized PostgreSQL ([`SelectQuery`]). With the `postgres`
//! feature, [`PgExecutor`] runs rendered queries through `sqlx`.
//!
//! ```no_run
//! use venture_criteria::{CriteriaBuilder, FilterMap, Schema, SelectQuery};
//!
//! # fn main() -> venture_criteria::Result<()> {
//! let schema = Schema::from_path("schema.json")?;
//! let filters: FilterMap =
//!     serde_json::from_str(r#"{"eq:id": 7, "pais.descripcion": "para"}"#).unwrap();
//! let condition = CriteriaBuilder::new(&schema).build("BswPersonas", &filters)?;
//! let query = SelectQuery::build(&schema, "BswPersonas", &condition)?;
//! println!("{}", query.sql());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod coerce;
pub mod condition;
pub mod error;
mod escape;
pub mod eval;
pub mod key;
pub mod path;
pub mod schema;
pub mod sql;
pub mod value;

// Re-export main types
pub use builder::{BuilderOptions, CriteriaBuilder, UnknownOperatorPolicy, DEFAULT_MAX_FILTERS};
pub use condition::{CaseSensitivity, Comparison, Condition, Operand};
pub use error::{CoercionError, Error, KeyError, ResolveError, Result, SchemaError};
pub use eval::filter_records;
pub use key::{FilterKey, Operator};
pub use path::{resolve, AttributePath, JoinStep};
pub use schema::{EntityDef, EntityModel, Schema};
pub use sql::{BindValue, SelectQuery};
#[cfg(feature = "postgres")]
pub use sql::{ExecuteError, PgExecutor};
pub use value::{FilterMap, FilterValue, Scalar, ValueKind, ValueType};
