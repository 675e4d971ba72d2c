use serde::{Deserialize, Serialize};

///
/// Value
///
/// Closed set of property value shapes supported by the resource contract.
/// Typed accessors apply the primitive-supporting coercions of the original
/// content API: numeric widening, scalar rendering to text, and unwrapping
/// of single-element lists.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
    BoolList(Vec<bool>),
    LongList(Vec<i64>),
    DoubleList(Vec<f64>),
    TextList(Vec<String>),
}

impl Value {
    /// Shape name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::BoolList(_) => "bool list",
            Self::LongList(_) => "long list",
            Self::DoubleList(_) => "double list",
            Self::TextList(_) => "text list",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::BoolList(l) if l.len() == 1 => Some(l[0]),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            Self::LongList(l) if l.len() == 1 => Some(l[0]),
            _ => None,
        }
    }

    /// Doubles widen from longs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Long(n) => Some(*n as f64),
            Self::DoubleList(l) if l.len() == 1 => Some(l[0]),
            _ => None,
        }
    }

    /// Text reads render scalars; multi-valued properties do not collapse.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Long(n) => Some(n.to_string()),
            Self::Double(d) => Some(d.to_string()),
            Self::TextList(l) if l.len() == 1 => Some(l[0].clone()),
            _ => None,
        }
    }

    /// Single-valued text reads as a one-element list.
    #[must_use]
    pub fn as_text_list(&self) -> Option<Vec<String>> {
        match self {
            Self::TextList(l) => Some(l.clone()),
            Self::Text(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_long_list(&self) -> Option<Vec<i64>> {
        match self {
            Self::LongList(l) => Some(l.clone()),
            Self::Long(n) => Some(vec![*n]),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Long(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::TextList(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Self::TextList(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Self::LongList(v)
    }
}
