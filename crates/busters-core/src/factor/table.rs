//! Dense probability tables over discrete variables.

use super::error::FactorError;
use super::value::{Assignment, Domains};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Probability table `P(unconditioned | conditioned)`.
///
/// Rows are stored row-major over the sorted union of both variable sets, the
/// last variable varying fastest. Rows need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    unconditioned: BTreeSet<String>,
    conditioned: BTreeSet<String>,
    domains: Arc<Domains>,
    scope: Vec<String>,
    radices: Vec<usize>,
    table: Vec<f64>,
}

impl Factor {
    /// Creates a zero-filled factor.
    pub fn new(
        unconditioned: &[&str],
        conditioned: &[&str],
        domains: Arc<Domains>,
    ) -> Result<Self, FactorError> {
        Self::from_sets(
            unconditioned.iter().map(|name| name.to_string()).collect(),
            conditioned.iter().map(|name| name.to_string()).collect(),
            domains,
        )
    }

    pub fn from_sets(
        unconditioned: BTreeSet<String>,
        conditioned: BTreeSet<String>,
        domains: Arc<Domains>,
    ) -> Result<Self, FactorError> {
        if let Some(variable) = unconditioned.intersection(&conditioned).next() {
            return Err(FactorError::OverlappingVariables {
                variable: variable.clone(),
            });
        }

        let scope: Vec<String> = unconditioned.union(&conditioned).cloned().collect();
        let mut radices = Vec::with_capacity(scope.len());
        for variable in &scope {
            let domain = domains
                .get(variable)
                .ok_or_else(|| FactorError::MissingDomain {
                    variable: variable.clone(),
                })?;
            radices.push(domain.len());
        }
        let rows = radices.iter().product();

        Ok(Self {
            unconditioned,
            conditioned,
            domains,
            scope,
            radices,
            table: vec![0.0; rows],
        })
    }

    pub fn unconditioned_variables(&self) -> &BTreeSet<String> {
        &self.unconditioned
    }

    pub fn conditioned_variables(&self) -> &BTreeSet<String> {
        &self.conditioned
    }

    /// Every variable of the factor, sorted.
    pub fn variables(&self) -> &[String] {
        &self.scope
    }

    pub fn contains_variable(&self, variable: &str) -> bool {
        self.unconditioned.contains(variable) || self.conditioned.contains(variable)
    }

    pub fn is_unconditioned(&self, variable: &str) -> bool {
        self.unconditioned.contains(variable)
    }

    pub fn domains(&self) -> &Arc<Domains> {
        &self.domains
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.table.iter().sum()
    }

    /// Probability of the row selected by `assignment`; extra variables are ignored.
    pub fn probability(&self, assignment: &Assignment) -> Result<f64, FactorError> {
        let offset = self.offset(assignment)?;
        Ok(self.table[offset])
    }

    pub fn set_probability(
        &mut self,
        assignment: &Assignment,
        probability: f64,
    ) -> Result<(), FactorError> {
        if !(probability >= 0.0) {
            return Err(FactorError::NegativeProbability { value: probability });
        }
        let offset = self.offset(assignment)?;
        self.table[offset] = probability;
        Ok(())
    }

    /// All full assignments in table order.
    pub fn assignments(&self) -> Assignments<'_> {
        Assignments {
            factor: self,
            cursor: Some(vec![0; self.scope.len()]),
        }
    }

    /// `(assignment, probability)` pairs in table order.
    pub fn rows(&self) -> impl Iterator<Item = (Assignment, f64)> + '_ {
        self.assignments().zip(self.table.iter().copied())
    }

    /// Same variables over `domains`, copying probabilities from this factor.
    ///
    /// Used to restrict a table to evidence: every value in the new domains
    /// must also be present in the current ones.
    pub fn specialize(&self, domains: Arc<Domains>) -> Result<Factor, FactorError> {
        let specialized = Factor::from_sets(
            self.unconditioned.clone(),
            self.conditioned.clone(),
            domains,
        )?;
        let table = specialized
            .assignments()
            .map(|assignment| self.probability(&assignment))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(specialized.with_table(table))
    }

    pub(crate) fn table(&self) -> &[f64] {
        &self.table
    }

    pub(crate) fn with_table(mut self, table: Vec<f64>) -> Self {
        debug_assert_eq!(table.len(), self.table.len());
        self.table = table;
        self
    }

    fn offset(&self, assignment: &Assignment) -> Result<usize, FactorError> {
        let mut offset = 0;
        for (variable, radix) in self.scope.iter().zip(&self.radices) {
            let value = assignment
                .get(variable)
                .ok_or_else(|| FactorError::MissingAssignment {
                    variable: variable.clone(),
                })?;
            let index = self
                .domains
                .get(variable)
                .and_then(|domain| domain.index_of(value))
                .ok_or_else(|| FactorError::ValueOutsideDomain {
                    variable: variable.clone(),
                    value: *value,
                })?;
            offset = offset * radix + index;
        }
        Ok(offset)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left: Vec<&str> = self.unconditioned.iter().map(String::as_str).collect();
        let right: Vec<&str> = self.conditioned.iter().map(String::as_str).collect();
        if right.is_empty() {
            writeln!(f, "P({})", left.join(", "))?;
        } else {
            writeln!(f, "P({} | {})", left.join(", "), right.join(", "))?;
        }
        for (assignment, probability) in self.rows() {
            let cells: Vec<String> = assignment
                .iter()
                .map(|(variable, value)| format!("{variable}={value}"))
                .collect();
            writeln!(f, "  {} -> {probability:.6}", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Iterator over the full assignments of a [`Factor`].
pub struct Assignments<'a> {
    factor: &'a Factor,
    cursor: Option<Vec<usize>>,
}

impl Iterator for Assignments<'_> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.cursor.as_mut()?;
        let mut assignment = Assignment::new();
        for (variable, index) in self.factor.scope.iter().zip(indices.iter()) {
            if let Some(domain) = self.factor.domains.get(variable) {
                assignment.insert(variable.clone(), domain.values()[*index]);
            }
        }

        if !advance(indices, &self.factor.radices) {
            self.cursor = None;
        }
        Some(assignment)
    }
}

/// Odometer increment, last digit fastest. Returns `false` once it wraps.
fn advance(indices: &mut [usize], radices: &[usize]) -> bool {
    for position in (0..indices.len()).rev() {
        indices[position] += 1;
        if indices[position] < radices[position] {
            return true;
        }
        indices[position] = 0;
    }
    false
}
