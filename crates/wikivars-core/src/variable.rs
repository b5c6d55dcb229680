//! Stored variable values

use serde::{Deserialize, Serialize};

/// A captured variable value.
///
/// `NeedsParse` holds raw markup that has to be expanded again wherever the
/// value is loaded; `Text` is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredVariable", into = "StoredVariable")]
pub enum Variable {
    Text(String),
    NeedsParse(String),
}

impl Variable {
    pub fn new(value: impl Into<String>, parse_on_load: bool) -> Self {
        if parse_on_load {
            Variable::NeedsParse(value.into())
        } else {
            Variable::Text(value.into())
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Variable::Text(value.into())
    }

    pub fn value(&self) -> &str {
        match self {
            Variable::Text(v) | Variable::NeedsParse(v) => v,
        }
    }

    pub fn parse_on_load(&self) -> bool {
        matches!(self, Variable::NeedsParse(_))
    }
}

/// Row shape of a variable in storage
#[derive(Serialize, Deserialize)]
struct StoredVariable {
    value: String,
    #[serde(default)]
    parse_on_load: bool,
}

impl From<StoredVariable> for Variable {
    fn from(row: StoredVariable) -> Self {
        Variable::new(row.value, row.parse_on_load)
    }
}

impl From<Variable> for StoredVariable {
    fn from(var: Variable) -> Self {
        let parse_on_load = var.parse_on_load();
        let value = match var {
            Variable::Text(v) | Variable::NeedsParse(v) => v,
        };
        StoredVariable {
            value,
            parse_on_load,
        }
    }
}
