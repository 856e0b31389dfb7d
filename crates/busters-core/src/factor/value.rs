use super::error::FactorError;
use crate::model::Position;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A value a variable can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Position(Position),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Position(position) => write!(f, "{position}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<Position> for Value {
    fn from(value: Position) -> Self {
        Value::Position(value)
    }
}

/// Values keyed by variable name. May name variables a factor does not use.
pub type Assignment = BTreeMap<String, Value>;

/// Builds an [`Assignment`] from `(name, value)` pairs.
pub fn assignment<I, S, V>(pairs: I) -> Assignment
where
    I: IntoIterator<Item = (S, V)>,
    S: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Ordered, duplicate-free list of legal values for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    values: Vec<Value>,
    lookup: HashMap<Value, usize>,
}

impl Domain {
    fn new(variable: &str, values: Vec<Value>) -> Result<Self, FactorError> {
        if values.is_empty() {
            return Err(FactorError::EmptyDomain {
                variable: variable.to_string(),
            });
        }
        let mut lookup = HashMap::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            if lookup.insert(*value, index).is_some() {
                return Err(FactorError::DuplicateValue {
                    variable: variable.to_string(),
                    value: *value,
                });
            }
        }
        Ok(Self { values, lookup })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.lookup.get(value).copied()
    }
}

/// Variable name to domain mapping shared by the factors of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domains {
    entries: BTreeMap<String, Domain>,
}

impl Domains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the domain of `variable`.
    pub fn insert<S, I, V>(&mut self, variable: S, values: I) -> Result<(), FactorError>
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let variable = variable.into();
        let domain = Domain::new(&variable, values.into_iter().map(Into::into).collect())?;
        self.entries.insert(variable, domain);
        Ok(())
    }

    /// Builder form of [`Domains::insert`].
    pub fn with<S, I, V>(mut self, variable: S, values: I) -> Result<Self, FactorError>
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.insert(variable, values)?;
        Ok(self)
    }

    pub fn get(&self, variable: &str) -> Option<&Domain> {
        self.entries.get(variable)
    }

    pub fn values(&self, variable: &str) -> Option<&[Value]> {
        self.entries.get(variable).map(Domain::values)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.entries.contains_key(variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Copy where every variable fixed by `fixed` has a one-value domain.
    pub fn restricted(&self, fixed: &Assignment) -> Result<Self, FactorError> {
        let mut restricted = self.clone();
        for (variable, value) in fixed {
            let domain = self
                .entries
                .get(variable)
                .ok_or_else(|| FactorError::MissingDomain {
                    variable: variable.clone(),
                })?;
            if domain.index_of(value).is_none() {
                return Err(FactorError::ValueOutsideDomain {
                    variable: variable.clone(),
                    value: *value,
                });
            }
            restricted
                .entries
                .insert(variable.clone(), Domain::new(variable, vec![*value])?);
        }
        Ok(restricted)
    }
}
