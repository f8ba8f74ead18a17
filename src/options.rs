//! Caller-supplied policy: which fields and operators a query may use, how
//! field values are typed, and how much structure a query may carry.
//!
//! Everything except custom predicates can be loaded from JSON:
//!
//! ```
//! use qast::ParseOptions;
//!
//! let options: ParseOptions = serde_json::from_str(r#"{
//!     "allowedFields": ["age", "city"],
//!     "allowedOperators": ["eq", "gt", "in"],
//!     "fieldTypes": { "age": { "type": "number" } },
//!     "maxDepth": 5
//! }"#).unwrap();
//! assert!(options.should_validate());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::ast::Operator;
use crate::complexity::ComplexityLimits;
use crate::value::{Scalar, Value};

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Datetime,
    Enum,
    Uuid,
    Json,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Enum => "enum",
            FieldType::Uuid => "uuid",
            FieldType::Json => "json",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom check run on a comparison value before type checks.
pub type FieldPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Schema entry for one field.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTypeDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub allow_null: bool,
    /// Accept a list value for scalar operators such as `eq`
    #[serde(default)]
    pub accepts_arrays: bool,
    #[serde(default)]
    pub enum_values: Option<Vec<Scalar>>,
    /// Type of list elements when `accepts_arrays` is set; defaults to `field_type`
    #[serde(default)]
    pub element_type: Option<FieldType>,
    #[serde(skip)]
    pub validator: Option<FieldPredicate>,
}

impl FieldTypeDefinition {
    pub fn new(field_type: FieldType) -> Self {
        FieldTypeDefinition {
            field_type,
            allow_null: false,
            accepts_arrays: false,
            enum_values: None,
            element_type: None,
            validator: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    pub fn accepting_arrays(mut self, element_type: Option<FieldType>) -> Self {
        self.accepts_arrays = true;
        self.element_type = element_type;
        self
    }

    pub fn with_enum_values(mut self, values: impl IntoIterator<Item = impl Into<Scalar>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_validator(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for FieldTypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTypeDefinition")
            .field("field_type", &self.field_type)
            .field("allow_null", &self.allow_null)
            .field("accepts_arrays", &self.accepts_arrays)
            .field("enum_values", &self.enum_values)
            .field("element_type", &self.element_type)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Fields, operators and field types a query is allowed to use.
///
/// Each part is optional; a missing part places no restriction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistOptions {
    #[serde(default)]
    pub allowed_fields: Option<BTreeSet<String>>,
    #[serde(default)]
    pub allowed_operators: Option<BTreeSet<Operator>>,
    #[serde(default)]
    pub field_types: Option<BTreeMap<String, FieldTypeDefinition>>,
}

impl WhitelistOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn allow_operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
        self.allowed_operators = Some(operators.into_iter().collect());
        self
    }

    pub fn field_type(mut self, field: impl Into<String>, definition: FieldTypeDefinition) -> Self {
        self.field_types
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), definition);
        self
    }

    /// True when any restriction is configured and non-empty.
    pub fn has_rules(&self) -> bool {
        self.allowed_fields.as_ref().is_some_and(|s| !s.is_empty())
            || self.allowed_operators.as_ref().is_some_and(|s| !s.is_empty())
            || self.field_types.as_ref().is_some_and(|m| !m.is_empty())
    }
}

/// Options for [`crate::parse_with`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    #[serde(flatten)]
    pub whitelist: WhitelistOptions,
    /// Run the validator; defaults to whether any whitelist rule is set
    #[serde(default)]
    pub validate: Option<bool>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub max_nodes: Option<usize>,
    #[serde(default)]
    pub max_clauses: Option<usize>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitelist(mut self, whitelist: WhitelistOptions) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = Some(max);
        self
    }

    pub fn max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = Some(max);
        self
    }

    pub fn max_clauses(mut self, max: usize) -> Self {
        self.max_clauses = Some(max);
        self
    }

    pub fn should_validate(&self) -> bool {
        self.validate.unwrap_or_else(|| self.whitelist.has_rules())
    }

    pub fn limits(&self) -> ComplexityLimits {
        ComplexityLimits {
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
            max_clauses: self.max_clauses,
        }
    }
}
