//! Module parameters.
//!
//! Parameters are set per module instance (from a scenario file or the
//! builder API) and read by the module through
//! [`ModuleContext::par`](crate::ModuleContext::par).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// A single configured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Double(_) => "double",
            ParamValue::Str(_) => "string",
        }
    }

    fn mismatch(&self, param: &str, expected: &'static str) -> SimError {
        SimError::ParamType {
            param: param.to_string(),
            expected,
            found: self.type_name(),
        }
    }

    pub fn as_int(&self, param: &str) -> SimResult<i64> {
        match self {
            ParamValue::Int(v) => Ok(*v),
            other => Err(other.mismatch(param, "int")),
        }
    }

    /// Integer that must not be negative.
    pub fn as_uint(&self, param: &str) -> SimResult<u64> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as u64),
            ParamValue::Int(_) => Err(SimError::ParamType {
                param: param.to_string(),
                expected: "non-negative int",
                found: "negative int",
            }),
            other => Err(other.mismatch(param, "non-negative int")),
        }
    }

    /// Doubles accept integer values as well.
    pub fn as_double(&self, param: &str) -> SimResult<f64> {
        match self {
            ParamValue::Double(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(other.mismatch(param, "double")),
        }
    }

    pub fn as_bool(&self, param: &str) -> SimResult<bool> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch(param, "bool")),
        }
    }

    pub fn as_str(&self, param: &str) -> SimResult<&str> {
        match self {
            ParamValue::Str(v) => Ok(v),
            other => Err(other.mismatch(param, "string")),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Double(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

/// Named parameters of one module instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
