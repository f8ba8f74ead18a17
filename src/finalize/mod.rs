//! Second phase for the envelope backends.
//!
//! The TypeORM and Sequelize compilers leave `__qast_operator__`,
//! `__qast_logical__` and `__qast_not__` envelopes in their output. A
//! finalizer walks that output and replaces every envelope with the matching
//! entry of a caller-supplied operator table, so this crate never needs the
//! ORM itself.
//!
//! ```
//! use qast::finalize::{SequelizeOperators, finalize_sequelize};
//! use serde_json::json;
//!
//! let ast = qast::parse("age gt 25 and name contains \"jo\"").unwrap();
//! let compiled = qast::compile_sequelize(&ast).unwrap();
//! let filter = finalize_sequelize(&compiled, &SequelizeOperators::aliases()).unwrap();
//! assert_eq!(filter, json!({"$and": [{"age": {"$gt": 25}}, {"name": {"$like": "%jo%"}}]}));
//! ```

pub mod sequelize;
pub mod typeorm;

use serde_json::Value as Json;
use thiserror::Error;

pub use sequelize::{SequelizeOperators, finalize_sequelize};
pub use typeorm::{OperatorFn, TypeOrmOperators, finalize_typeorm};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FinalizeError {
    /// The operator table lacks an entry the filter needs
    #[error("{backend} operator table has no entry for '{name}'")]
    MissingOperator { backend: &'static str, name: String },

    /// The filter uses a combination the backend cannot express
    #[error("Unsupported {backend} filter: {message}")]
    Unsupported {
        backend: &'static str,
        message: String,
    },

    /// The input was not produced by the matching compiler
    #[error("Invalid {backend} envelope: {message}")]
    InvalidEnvelope {
        backend: &'static str,
        message: String,
    },
}

/// Text used inside a LIKE pattern for an envelope value.
pub(crate) fn pattern_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `[lower, upper]` of a `between` envelope with nulls mapped to `None`.
pub(crate) fn range_bounds(value: &Json) -> Option<(Option<&Json>, Option<&Json>)> {
    match value.as_array()?.as_slice() {
        [lower, upper] => Some((
            Some(lower).filter(|v| !v.is_null()),
            Some(upper).filter(|v| !v.is_null()),
        )),
        _ => None,
    }
}
