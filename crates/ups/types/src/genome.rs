use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single tunable parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Choice(String),
}

impl ParamValue {
    /// Numeric view of the value; `None` for categorical choices.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Choice(_) => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            ParamValue::Choice(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Choice(c) => write!(f, "{}", c),
        }
    }
}

/// Structural description of a solution: its algorithm family, the chosen
/// structural components (preprocessing step, architecture shape, ...) and the
/// tunable parameters of the family.
///
/// Ordered maps keep every derived value (signatures, rendered code, dedup
/// keys) deterministic.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Genome {
    pub family: String,
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl Genome {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            components: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_component(mut self, slot: impl Into<String>, choice: impl Into<String>) -> Self {
        self.components.insert(slot.into(), choice.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Canonical text form, used to drop duplicate candidates within a batch.
    pub fn canonical_key(&self) -> String {
        let mut key = format!("family={}", self.family);
        for (slot, choice) in &self.components {
            key.push_str(&format!(";c:{}={}", slot, choice));
        }
        for (name, value) in &self.parameters {
            key.push_str(&format!(";p:{}={}", name, value));
        }
        key
    }
}
