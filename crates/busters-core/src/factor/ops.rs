//! Join, eliminate and normalize: the factor algebra behind exact inference.
//!
//! Every operation allocates a fresh factor and leaves its inputs untouched.
//! The `*_tracked` variants additionally record the call in a [`CallLog`] so
//! callers can check the order in which variables were joined and eliminated.

use super::error::FactorError;
use super::table::Factor;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One recorded algebra call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgebraCall {
    Join(String),
    Eliminate(String),
}

/// Ordered record of algebra calls made during a query.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallLog {
    calls: Vec<AlgebraCall>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, call: AlgebraCall) {
        self.calls.push(call);
    }

    pub fn calls(&self) -> &[AlgebraCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Variables eliminated so far, in call order.
    pub fn eliminated(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                AlgebraCall::Eliminate(variable) => Some(variable.as_str()),
                AlgebraCall::Join(_) => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

/// Joins every factor mentioning `variable`.
///
/// Returns the factors that do not mention it together with the joined factor.
pub fn join_factors_by_variable(
    factors: Vec<Factor>,
    variable: &str,
) -> Result<(Vec<Factor>, Factor), FactorError> {
    join_factors_by_variable_tracked(factors, variable, None)
}

pub fn join_factors_by_variable_tracked(
    factors: Vec<Factor>,
    variable: &str,
    log: Option<&mut CallLog>,
) -> Result<(Vec<Factor>, Factor), FactorError> {
    if let Some(log) = log {
        log.record(AlgebraCall::Join(variable.to_string()));
    }

    let (to_join, untouched): (Vec<Factor>, Vec<Factor>) = factors
        .into_iter()
        .partition(|factor| factor.contains_variable(variable));

    if to_join.is_empty() {
        return Err(FactorError::NoFactorMentions {
            variable: variable.to_string(),
        });
    }

    let unconditioned_in = to_join
        .iter()
        .filter(|factor| factor.is_unconditioned(variable))
        .count();
    if unconditioned_in > 1 {
        return Err(FactorError::AmbiguousJoinVariable {
            variable: variable.to_string(),
            factors: unconditioned_in,
        });
    }

    let joined = join_factors(&to_join)?;
    Ok((untouched, joined))
}

/// Pointwise product of `factors`.
///
/// A variable may be unconditioned in at most one input. Variables that are
/// unconditioned anywhere are unconditioned in the result; the remaining
/// conditioned variables stay conditioned. Domains come from the first factor.
pub fn join_factors(factors: &[Factor]) -> Result<Factor, FactorError> {
    let Some(first) = factors.first() else {
        return Err(FactorError::EmptyJoin);
    };

    let mut unconditioned = BTreeSet::new();
    let mut duplicated = BTreeSet::new();
    for factor in factors {
        for variable in factor.unconditioned_variables() {
            if !unconditioned.insert(variable.clone()) {
                duplicated.insert(variable.clone());
            }
        }
    }
    if !duplicated.is_empty() {
        return Err(FactorError::DuplicateUnconditioned {
            variables: duplicated.into_iter().collect(),
        });
    }

    let conditioned: BTreeSet<String> = factors
        .iter()
        .flat_map(|factor| factor.conditioned_variables().iter())
        .filter(|variable| !unconditioned.contains(*variable))
        .cloned()
        .collect();

    let joined = Factor::from_sets(unconditioned, conditioned, Arc::clone(first.domains()))?;
    let table = joined
        .assignments()
        .map(|assignment| {
            factors
                .iter()
                .try_fold(1.0, |product: f64, factor| -> Result<f64, FactorError> {
                    Ok(product * factor.probability(&assignment)?)
                })
        })
        .collect::<Result<Vec<f64>, FactorError>>()?;
    Ok(joined.with_table(table))
}

/// Sums `variable` out of `factor`.
pub fn eliminate(factor: &Factor, variable: &str) -> Result<Factor, FactorError> {
    eliminate_tracked(factor, variable, None)
}

pub fn eliminate_tracked(
    factor: &Factor,
    variable: &str,
    log: Option<&mut CallLog>,
) -> Result<Factor, FactorError> {
    if let Some(log) = log {
        log.record(AlgebraCall::Eliminate(variable.to_string()));
    }

    if !factor.is_unconditioned(variable) {
        return Err(FactorError::NotUnconditioned {
            variable: variable.to_string(),
        });
    }
    if factor.unconditioned_variables().len() == 1 {
        return Err(FactorError::SoleUnconditioned {
            variable: variable.to_string(),
        });
    }

    let values = factor
        .domains()
        .values(variable)
        .ok_or_else(|| FactorError::MissingDomain {
            variable: variable.to_string(),
        })?;

    let mut unconditioned = factor.unconditioned_variables().clone();
    unconditioned.remove(variable);
    let reduced = Factor::from_sets(
        unconditioned,
        factor.conditioned_variables().clone(),
        Arc::clone(factor.domains()),
    )?;

    let table = reduced
        .assignments()
        .map(|mut assignment| -> Result<f64, FactorError> {
            let mut sum = 0.0;
            for value in values {
                assignment.insert(variable.to_string(), *value);
                sum += factor.probability(&assignment)?;
            }
            Ok(sum)
        })
        .collect::<Result<Vec<f64>, FactorError>>()?;
    Ok(reduced.with_table(table))
}

/// Rescales `factor` to total mass one.
///
/// Every conditioned variable must be pinned to a single value. Unconditioned
/// variables with a single-value domain (evidence) become conditioned.
pub fn normalize(factor: &Factor) -> Result<Factor, FactorError> {
    let domains = factor.domains();
    let domain_len = |variable: &str| domains.get(variable).map_or(0, |domain| domain.len());

    for variable in factor.conditioned_variables() {
        if domain_len(variable.as_str()) > 1 {
            return Err(FactorError::AmbiguousCondition {
                variable: variable.clone(),
            });
        }
    }

    let (unconditioned, pinned): (BTreeSet<String>, BTreeSet<String>) = factor
        .unconditioned_variables()
        .iter()
        .cloned()
        .partition(|variable| domain_len(variable.as_str()) > 1);
    let conditioned: BTreeSet<String> = factor
        .conditioned_variables()
        .iter()
        .cloned()
        .chain(pinned)
        .collect();

    let total = factor.total();
    if !(total > 0.0) {
        return Err(FactorError::ZeroMass);
    }

    // Same variable set, so the row order is unchanged.
    let normalized = Factor::from_sets(unconditioned, conditioned, Arc::clone(domains))?;
    let table = factor.table().iter().map(|value| value / total).collect();
    Ok(normalized.with_table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::value::{Assignment, Domains, Value, assignment};

    fn domains() -> Arc<Domains> {
        Arc::new(
            Domains::new()
                .with("A", [0, 1])
                .and_then(|d| d.with("B", [0, 1, 2]))
                .and_then(|d| d.with("C", [true, false]))
                .expect("valid domains"),
        )
    }

    fn filled(unconditioned: &[&str], conditioned: &[&str], seed: f64) -> Factor {
        let mut factor = Factor::new(unconditioned, conditioned, domains()).unwrap();
        let rows: Vec<Assignment> = factor.assignments().collect();
        for (index, row) in rows.iter().enumerate() {
            let value = ((index as f64 + 1.0) * seed).fract() + 0.05;
            factor.set_probability(row, value).unwrap();
        }
        factor
    }

    #[test]
    fn join_multiplies_rows() {
        let a = filled(&["A"], &[], 0.37);
        let b_given_a = filled(&["B"], &["A"], 0.61);
        let joined = join_factors(&[a.clone(), b_given_a.clone()]).unwrap();

        assert_eq!(
            joined.unconditioned_variables().iter().collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert!(joined.conditioned_variables().is_empty());
        for (row, probability) in joined.rows() {
            let expected = a.probability(&row).unwrap() * b_given_a.probability(&row).unwrap();
            assert!((probability - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn join_keeps_unresolved_conditions() {
        let b_given_a = filled(&["B"], &["A"], 0.2);
        let c_given_a = filled(&["C"], &["A"], 0.3);
        let joined = join_factors(&[b_given_a, c_given_a]).unwrap();
        assert_eq!(
            joined.conditioned_variables().iter().collect::<Vec<_>>(),
            vec!["A"]
        );
        assert_eq!(joined.len(), 2 * 3 * 2);
    }

    #[test]
    fn join_rejects_shared_unconditioned_variable() {
        let err = join_factors(&[filled(&["A"], &[], 0.1), filled(&["A", "B"], &[], 0.2)])
            .expect_err("A is unconditioned twice");
        assert_eq!(
            err,
            FactorError::DuplicateUnconditioned {
                variables: vec!["A".into()]
            }
        );
        assert_eq!(join_factors(&[]), Err(FactorError::EmptyJoin));
    }

    #[test]
    fn join_by_variable_partitions_and_logs() {
        let factors = vec![
            filled(&["A"], &[], 0.1),
            filled(&["B"], &["A"], 0.2),
            filled(&["C"], &[], 0.3),
        ];
        let mut log = CallLog::new();
        let (rest, joined) =
            join_factors_by_variable_tracked(factors, "A", Some(&mut log)).unwrap();
        assert_eq!(rest.len(), 1);
        assert!(rest[0].is_unconditioned("C"));
        assert!(joined.is_unconditioned("A") && joined.is_unconditioned("B"));
        assert_eq!(log.calls(), &[AlgebraCall::Join("A".into())]);
    }

    #[test]
    fn join_by_variable_rejects_ambiguous_target() {
        let factors = vec![filled(&["A"], &[], 0.1), filled(&["A"], &["C"], 0.2)];
        let err = join_factors_by_variable(factors, "A").expect_err("ambiguous");
        assert_eq!(
            err,
            FactorError::AmbiguousJoinVariable {
                variable: "A".into(),
                factors: 2
            }
        );

        let err = join_factors_by_variable(vec![filled(&["C"], &[], 0.4)], "B")
            .expect_err("nothing mentions B");
        assert!(matches!(err, FactorError::NoFactorMentions { .. }));
    }

    #[test]
    fn eliminate_sums_out_variable() {
        let joint = filled(&["A", "B"], &["C"], 0.43);
        let marginal = eliminate(&joint, "B").unwrap();
        assert!(marginal.is_unconditioned("A"));
        assert!(!marginal.contains_variable("B"));
        assert!(marginal.conditioned_variables().contains("C"));

        for (row, probability) in marginal.rows() {
            let mut expected = 0.0;
            for b in 0..3 {
                let mut wide = row.clone();
                wide.insert("B".into(), Value::Int(b));
                expected += joint.probability(&wide).unwrap();
            }
            assert!((probability - expected).abs() < 1e-12);
        }
        assert!((marginal.total() - joint.total()).abs() < 1e-9);
    }

    #[test]
    fn eliminate_rejects_invalid_targets() {
        let joint = filled(&["A"], &["C"], 0.5);
        assert!(matches!(
            eliminate(&joint, "C"),
            Err(FactorError::NotUnconditioned { .. })
        ));
        assert!(matches!(
            eliminate(&joint, "A"),
            Err(FactorError::SoleUnconditioned { .. })
        ));
    }

    #[test]
    fn sequential_elimination_preserves_mass() {
        let joint = filled(&["A", "B", "C"], &[], 0.77);
        let total = joint.total();
        let step = eliminate(&joint, "A").unwrap();
        let last = eliminate(&step, "C").unwrap();
        assert!((last.total() - total).abs() < 1e-9);

        let other_order = eliminate(&eliminate(&joint, "C").unwrap(), "A").unwrap();
        for (row, probability) in last.rows() {
            assert!((other_order.probability(&row).unwrap() - probability).abs() < 1e-12);
        }
    }

    #[test]
    fn normalize_moves_pinned_variables_to_condition() {
        let full = domains();
        let evidence = assignment([("C", true)]);
        let pinned = Arc::new(full.restricted(&evidence).unwrap());
        let joint = filled(&["A", "C"], &[], 0.3).specialize(pinned).unwrap();

        let normalized = normalize(&joint).unwrap();
        assert!((normalized.total() - 1.0).abs() < 1e-12);
        assert!(normalized.conditioned_variables().contains("C"));
        assert!(normalized.is_unconditioned("A"));
    }

    #[test]
    fn normalize_rejects_open_conditions_and_zero_mass() {
        let conditional = filled(&["A"], &["B"], 0.2);
        assert!(matches!(
            normalize(&conditional),
            Err(FactorError::AmbiguousCondition { .. })
        ));
        let empty = Factor::new(&["A"], &[], domains()).unwrap();
        assert_eq!(normalize(&empty), Err(FactorError::ZeroMass));
    }
}
