use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key under which the optional construction parameter is delivered.
pub const PARAM_KEY: &str = "param";

/// Value handed to an extension constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionParam {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ExtensionParam>),
    Map(BTreeMap<String, ExtensionParam>),
}

impl ExtensionParam {
    pub fn type_name(&self) -> &'static str {
        match self {
            ExtensionParam::Bool(_) => "bool",
            ExtensionParam::Integer(_) => "integer",
            ExtensionParam::Float(_) => "float",
            ExtensionParam::Text(_) => "text",
            ExtensionParam::List(_) => "list",
            ExtensionParam::Map(_) => "map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExtensionParam::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ExtensionParam::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExtensionParam::Float(value) => Some(*value),
            ExtensionParam::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtensionParam::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ExtensionParam]> {
        match self {
            ExtensionParam::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ExtensionParam>> {
        match self {
            ExtensionParam::Map(values) => Some(values),
            _ => None,
        }
    }
}

impl From<bool> for ExtensionParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ExtensionParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ExtensionParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ExtensionParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExtensionParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<ExtensionParam>> for ExtensionParam {
    fn from(values: Vec<ExtensionParam>) -> Self {
        Self::List(values)
    }
}

impl fmt::Display for ExtensionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionParam::Bool(value) => write!(f, "{value}"),
            ExtensionParam::Integer(value) => write!(f, "{value}"),
            ExtensionParam::Float(value) => write!(f, "{value}"),
            ExtensionParam::Text(value) => write!(f, "{value:?}"),
            ExtensionParam::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            ExtensionParam::Map(values) => {
                f.write_str("{")?;
                for (index, (key, value)) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Named arguments passed to an extension constructor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructArgs {
    values: BTreeMap<String, ExtensionParam>,
}

impl ConstructArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments carrying `param` under [`PARAM_KEY`], or no arguments at all.
    pub fn with_param(param: Option<ExtensionParam>) -> Self {
        let mut args = Self::new();
        if let Some(param) = param {
            args.insert(PARAM_KEY, param);
        }
        args
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ExtensionParam) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ExtensionParam> {
        self.values.get(key)
    }

    pub fn param(&self) -> Option<&ExtensionParam> {
        self.get(PARAM_KEY)
    }

    /// Like [`ConstructArgs::param`] but fails when the parameter is absent.
    pub fn require_param(&self) -> Result<&ExtensionParam, ConstructError> {
        self.param()
            .ok_or(ConstructError::MissingArgument(PARAM_KEY))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionParam)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[derive(Debug, Error)]
pub enum ConstructError {
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),
    #[error("argument `{key}` expected {expected} value but received {actual}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("{0}")]
    Failed(String),
}

impl ConstructError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn wrong_type(key: &'static str, expected: &'static str, actual: &ExtensionParam) -> Self {
        Self::WrongType {
            key,
            expected,
            actual: actual.type_name(),
        }
    }
}
