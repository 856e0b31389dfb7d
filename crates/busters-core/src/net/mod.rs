//! Bayes nets over discrete variables and the queries run against them.

pub mod busters;
pub mod query;

use crate::factor::{Assignment, Domains, Factor, FactorError, Value};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum NetError {
    UnknownVariable { variable: String },
    DuplicateVariable { variable: String },
    CptMismatch { variable: String },
    Cycle,
    Factor(FactorError),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::UnknownVariable { variable } => {
                write!(f, "{variable} is not a variable of the net")
            }
            NetError::DuplicateVariable { variable } => {
                write!(f, "{variable} is declared more than once")
            }
            NetError::CptMismatch { variable } => write!(
                f,
                "table for {variable} must be P({variable} | parents of {variable})"
            ),
            NetError::Cycle => write!(f, "edges form a directed cycle"),
            NetError::Factor(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for NetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetError::Factor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FactorError> for NetError {
    fn from(err: FactorError) -> Self {
        NetError::Factor(err)
    }
}

/// Directed acyclic model with one conditional table per variable.
///
/// Tables start zero-filled; populate them with [`BayesNet::set_cpt`] or one
/// of the fill helpers before querying.
#[derive(Debug, Clone)]
pub struct BayesNet {
    variables: Vec<String>,
    edges: Vec<(String, String)>,
    parents: BTreeMap<String, BTreeSet<String>>,
    domains: Arc<Domains>,
    cpts: BTreeMap<String, Factor>,
    topological: Vec<String>,
}

impl BayesNet {
    pub fn new(
        variables: &[&str],
        edges: &[(&str, &str)],
        domains: Domains,
    ) -> Result<Self, NetError> {
        let mut declared = BTreeSet::new();
        for variable in variables {
            if !declared.insert(variable.to_string()) {
                return Err(NetError::DuplicateVariable {
                    variable: variable.to_string(),
                });
            }
        }

        let mut parents: BTreeMap<String, BTreeSet<String>> = declared
            .iter()
            .map(|variable| (variable.clone(), BTreeSet::new()))
            .collect();
        for (from, to) in edges {
            for end in [from, to] {
                if !declared.contains(*end) {
                    return Err(NetError::UnknownVariable {
                        variable: end.to_string(),
                    });
                }
            }
            if let Some(set) = parents.get_mut(*to) {
                set.insert(from.to_string());
            }
        }

        let variables: Vec<String> = variables.iter().map(|name| name.to_string()).collect();
        let topological = topological_order(&variables, &parents)?;
        let domains = Arc::new(domains);

        let mut cpts = BTreeMap::new();
        for variable in &variables {
            let cpt = Factor::from_sets(
                BTreeSet::from([variable.clone()]),
                parents[variable].clone(),
                Arc::clone(&domains),
            )?;
            cpts.insert(variable.clone(), cpt);
        }

        Ok(Self {
            variables,
            edges: edges
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            parents,
            domains,
            cpts,
            topological,
        })
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    /// Variables ordered so that every parent precedes its children.
    pub fn topological_order(&self) -> &[String] {
        &self.topological
    }

    pub fn contains_variable(&self, variable: &str) -> bool {
        self.cpts.contains_key(variable)
    }

    pub fn parents(&self, variable: &str) -> Option<&BTreeSet<String>> {
        self.parents.get(variable)
    }

    pub fn domains(&self) -> &Arc<Domains> {
        &self.domains
    }

    pub fn cpt(&self, variable: &str) -> Option<&Factor> {
        self.cpts.get(variable)
    }

    /// Replaces the table of `variable`, which must be `P(variable | parents)`.
    pub fn set_cpt(&mut self, variable: &str, cpt: Factor) -> Result<(), NetError> {
        let parents = self
            .parents
            .get(variable)
            .ok_or_else(|| NetError::UnknownVariable {
                variable: variable.to_string(),
            })?;
        let shaped = cpt.unconditioned_variables().len() == 1
            && cpt.is_unconditioned(variable)
            && cpt.conditioned_variables() == parents;
        if !shaped {
            return Err(NetError::CptMismatch {
                variable: variable.to_string(),
            });
        }
        self.cpts.insert(variable.to_string(), cpt);
        Ok(())
    }

    /// Every table with evidence variables restricted to their observed value.
    pub fn cpts_with_evidence(&self, evidence: &Assignment) -> Result<Vec<Factor>, NetError> {
        if evidence.is_empty() {
            return Ok(self.variables.iter().map(|v| self.cpts[v].clone()).collect());
        }
        let restricted = Arc::new(self.domains.restricted(evidence)?);
        self.variables
            .iter()
            .map(|variable| {
                self.cpts[variable]
                    .specialize(Arc::clone(&restricted))
                    .map_err(NetError::from)
            })
            .collect()
    }

    /// Fills every table with random conditional distributions.
    ///
    /// Each row of a table (one per parent assignment) sums to one.
    pub fn fill_random_cpts<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), NetError> {
        for variable in self.variables.clone() {
            let mut cpt = self.cpts[&variable].clone();
            let weights: Vec<(Assignment, f64)> = cpt
                .assignments()
                .map(|row| (row, rng.gen_range(0.05..1.0)))
                .collect();

            let mut totals: BTreeMap<Vec<Value>, f64> = BTreeMap::new();
            for (row, weight) in &weights {
                *totals.entry(parent_key(&cpt, row)).or_insert(0.0) += weight;
            }
            for (row, weight) in &weights {
                let total = totals[&parent_key(&cpt, row)];
                cpt.set_probability(row, weight / total)?;
            }
            self.cpts.insert(variable, cpt);
        }
        Ok(())
    }
}

fn parent_key(cpt: &Factor, row: &Assignment) -> Vec<Value> {
    cpt.conditioned_variables()
        .iter()
        .filter_map(|parent| row.get(parent).copied())
        .collect()
}

/// Kahn's algorithm, ties broken by declaration order.
fn topological_order(
    variables: &[String],
    parents: &BTreeMap<String, BTreeSet<String>>,
) -> Result<Vec<String>, NetError> {
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut order = Vec::with_capacity(variables.len());
    while order.len() < variables.len() {
        let next = variables.iter().find(|variable| {
            !placed.contains(variable.as_str())
                && parents[*variable]
                    .iter()
                    .all(|parent| placed.contains(parent.as_str()))
        });
        let Some(next) = next else {
            return Err(NetError::Cycle);
        };
        placed.insert(next.as_str());
        order.push(next.clone());
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::assignment;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sprinkler_domains() -> Domains {
        Domains::new()
            .with("Cloudy", [true, false])
            .and_then(|d| d.with("Rain", [true, false]))
            .and_then(|d| d.with("Wet", [true, false]))
            .expect("valid domains")
    }

    #[test]
    fn builds_empty_tables_with_parent_conditions() {
        let net = BayesNet::new(
            &["Wet", "Rain", "Cloudy"],
            &[("Cloudy", "Rain"), ("Rain", "Wet")],
            sprinkler_domains(),
        )
        .unwrap();
        let wet = net.cpt("Wet").unwrap();
        assert!(wet.is_unconditioned("Wet"));
        assert!(wet.conditioned_variables().contains("Rain"));
        assert_eq!(wet.total(), 0.0);
        assert_eq!(net.topological_order(), &["Cloudy", "Rain", "Wet"]);
    }

    #[test]
    fn rejects_cycles_and_unknown_edges() {
        let err = BayesNet::new(
            &["Rain", "Wet"],
            &[("Rain", "Wet"), ("Wet", "Rain")],
            sprinkler_domains(),
        )
        .unwrap_err();
        assert_eq!(err, NetError::Cycle);

        let err = BayesNet::new(&["Rain"], &[("Snow", "Rain")], sprinkler_domains()).unwrap_err();
        assert!(matches!(err, NetError::UnknownVariable { .. }));

        let err = BayesNet::new(&["Rain", "Rain"], &[], sprinkler_domains()).unwrap_err();
        assert!(matches!(err, NetError::DuplicateVariable { .. }));
    }

    #[test]
    fn set_cpt_checks_shape() {
        let mut net = BayesNet::new(&["Rain", "Wet"], &[("Rain", "Wet")], sprinkler_domains())
            .unwrap();
        let wrong = Factor::new(&["Wet"], &[], Arc::clone(net.domains())).unwrap();
        assert_eq!(
            net.set_cpt("Wet", wrong),
            Err(NetError::CptMismatch {
                variable: "Wet".into()
            })
        );
        let right = Factor::new(&["Wet"], &["Rain"], Arc::clone(net.domains())).unwrap();
        assert!(net.set_cpt("Wet", right).is_ok());
    }

    #[test]
    fn random_tables_are_conditional_distributions() {
        let mut net = BayesNet::new(
            &["Cloudy", "Rain", "Wet"],
            &[("Cloudy", "Rain"), ("Rain", "Wet")],
            sprinkler_domains(),
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        net.fill_random_cpts(&mut rng).unwrap();

        let wet = net.cpt("Wet").unwrap();
        for rain in [true, false] {
            let sum: f64 = [true, false]
                .into_iter()
                .map(|w| {
                    wet.probability(&assignment([("Rain", rain), ("Wet", w)]))
                        .unwrap()
                })
                .sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert!((net.cpt("Cloudy").unwrap().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn evidence_restricts_every_table() {
        let mut net = BayesNet::new(&["Rain", "Wet"], &[("Rain", "Wet")], sprinkler_domains())
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        net.fill_random_cpts(&mut rng).unwrap();

        let evidence = assignment([("Rain", true)]);
        let tables = net.cpts_with_evidence(&evidence).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 1);
        assert_eq!(tables[1].len(), 2);

        let outside = assignment([("Rain", 3)]);
        assert!(matches!(
            net.cpts_with_evidence(&outside),
            Err(NetError::Factor(FactorError::ValueOutsideDomain { .. }))
        ));
    }
}
