use serde::{Deserialize, Serialize};

/// A single literal value appearing on the right-hand side of a comparison.
///
/// Integers and floats are kept apart so that `age eq 25` and `score eq 2.5`
/// reach the backends with the number type the user wrote.
///
/// # Examples
///
/// ```
/// use qast::Scalar;
///
/// let null = Scalar::Null;
/// let boolean = Scalar::Boolean(true);
/// let integer = Scalar::Integer(42);
/// let float = Scalar::Float(3.14);
/// let string = Scalar::String("Paris".to_string());
/// assert!(null.is_null());
/// assert_eq!(string.as_str(), Some("Paris"));
/// # let _ = (boolean, integer, float);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// `null`
    Null,

    /// `true` / `false`
    Boolean(bool),

    /// Integer number, optionally negative
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Quoted string, escapes already resolved
    String(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Integer(n) => Some(*n as f64),
            Scalar::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form used when a value is embedded into a pattern (LIKE, regex).
    pub fn as_text(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Integer(n) => n.to_string(),
            Scalar::Boolean(b) => b.to_string(),
            Scalar::Null => "null".to_string(),
        }
    }

    /// Returns a human-readable type name, used in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Boolean(_) => "boolean",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

impl From<&Scalar> for serde_json::Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Boolean(b) => serde_json::Value::Bool(*b),
            Scalar::Integer(n) => serde_json::Value::Number((*n).into()),
            Scalar::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

/// The value side of a comparison.
///
/// - `Scalar` for every operator except the list and range ones
/// - `List` for `in` / `notIn` (and for `eq` on fields that accept arrays)
/// - `Range` for `between`; a `Scalar::Null` bound means unbounded on that side
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Range(Scalar, Scalar),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Range bounds with `null` mapped to `None`.
    pub fn as_range(&self) -> Option<(Option<&Scalar>, Option<&Scalar>)> {
        match self {
            Value::Range(lower, upper) => Some((
                Some(lower).filter(|s| !s.is_null()),
                Some(upper).filter(|s| !s.is_null()),
            )),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Range(..) => "range",
        }
    }

    /// JSON form of the value. Ranges become two-element arrays.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Scalar(s) => s.to_json(),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Scalar::to_json).collect())
            }
            Value::Range(lower, upper) => {
                serde_json::Value::Array(vec![lower.to_json(), upper.to_json()])
            }
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(items: Vec<Scalar>) -> Self {
        Value::List(items)
    }
}
