//! Exact and sampled `P(query | evidence)` queries over a [`BayesNet`].

use super::{BayesNet, NetError};
use crate::factor::{
    Assignment, CallLog, Factor, FactorError, Value, eliminate_tracked, join_factors,
    join_factors_by_variable_tracked, normalize, sample_from_factor,
};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    EmptyQuery,
    UnknownVariable { variable: String },
    EvidenceOutsideDomain { variable: String, value: Value },
    QueryEvidenceOverlap { variable: String },
    InvalidEliminationOrder { variable: String },
    NoSamples,
    ZeroWeight,
    Net(NetError),
    Factor(FactorError),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::EmptyQuery => write!(f, "query names no variables"),
            InferenceError::UnknownVariable { variable } => {
                write!(f, "{variable} is not a variable of the net")
            }
            InferenceError::EvidenceOutsideDomain { variable, value } => {
                write!(f, "evidence {variable}={value} is outside its domain")
            }
            InferenceError::QueryEvidenceOverlap { variable } => {
                write!(f, "{variable} is both queried and observed")
            }
            InferenceError::InvalidEliminationOrder { variable } => {
                write!(f, "elimination order misplaces {variable}")
            }
            InferenceError::NoSamples => write!(f, "sampling needs at least one sample"),
            InferenceError::ZeroWeight => {
                write!(f, "every sample had zero weight under the evidence")
            }
            InferenceError::Net(err) => write!(f, "{err}"),
            InferenceError::Factor(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InferenceError::Net(err) => Some(err),
            InferenceError::Factor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NetError> for InferenceError {
    fn from(err: NetError) -> Self {
        InferenceError::Net(err)
    }
}

impl From<FactorError> for InferenceError {
    fn from(err: FactorError) -> Self {
        InferenceError::Factor(err)
    }
}

/// Reference query: build the full joint, then marginalize.
pub fn inference_by_enumeration(
    net: &BayesNet,
    query: &[&str],
    evidence: &Assignment,
) -> Result<Factor, InferenceError> {
    inference_by_enumeration_tracked(net, query, evidence, None)
}

pub fn inference_by_enumeration_tracked(
    net: &BayesNet,
    query: &[&str],
    evidence: &Assignment,
    mut log: Option<&mut CallLog>,
) -> Result<Factor, InferenceError> {
    let hidden = hidden_variables(net, query, evidence)?;

    let mut factors = net.cpts_with_evidence(evidence)?;
    for variable in net.variables() {
        let (mut rest, joined) =
            join_factors_by_variable_tracked(factors, variable, log.as_deref_mut())?;
        rest.push(joined);
        factors = rest;
    }

    let mut joint = join_factors(&factors)?;
    for variable in &hidden {
        joint = eliminate_tracked(&joint, variable, log.as_deref_mut())?;
    }
    Ok(normalize(&joint)?)
}

/// Interleaves joins and eliminations following `order`.
///
/// `order` defaults to the sorted hidden variables. A supplied order must name
/// every hidden variable and nothing from the query or evidence. A joined factor left with
/// a single unconditioned variable sums to one over it and is dropped.
pub fn inference_by_variable_elimination(
    net: &BayesNet,
    query: &[&str],
    evidence: &Assignment,
    order: Option<&[String]>,
) -> Result<Factor, InferenceError> {
    inference_by_variable_elimination_tracked(net, query, evidence, order, None)
}

pub fn inference_by_variable_elimination_tracked(
    net: &BayesNet,
    query: &[&str],
    evidence: &Assignment,
    order: Option<&[String]>,
    mut log: Option<&mut CallLog>,
) -> Result<Factor, InferenceError> {
    let hidden = hidden_variables(net, query, evidence)?;
    let order: Vec<String> = match order {
        Some(order) => {
            for variable in order {
                if !net.contains_variable(variable) {
                    return Err(InferenceError::UnknownVariable {
                        variable: variable.clone(),
                    });
                }
                if query.contains(&variable.as_str()) || evidence.contains_key(variable) {
                    return Err(InferenceError::InvalidEliminationOrder {
                        variable: variable.clone(),
                    });
                }
            }
            if let Some(missing) = hidden.iter().find(|variable| !order.contains(variable)) {
                return Err(InferenceError::InvalidEliminationOrder {
                    variable: missing.clone(),
                });
            }
            order.to_vec()
        }
        None => hidden.into_iter().collect(),
    };

    let mut factors = net.cpts_with_evidence(evidence)?;
    for variable in &order {
        let (mut rest, joined) =
            join_factors_by_variable_tracked(factors, variable, log.as_deref_mut())?;
        if joined.unconditioned_variables().len() > 1 {
            rest.push(eliminate_tracked(&joined, variable, log.as_deref_mut())?);
        }
        factors = rest;
    }

    Ok(normalize(&join_factors(&factors)?)?)
}

/// Approximate query by likelihood weighting.
///
/// Non-evidence variables are sampled in topological order from their table;
/// evidence variables keep their observed value and scale the sample weight by
/// its probability. The result has the same shape as the exact queries.
pub fn inference_by_likelihood_weighting<R: Rng + ?Sized>(
    net: &BayesNet,
    query: &[&str],
    evidence: &Assignment,
    samples: usize,
    rng: &mut R,
) -> Result<Factor, InferenceError> {
    hidden_variables(net, query, evidence)?;
    if samples == 0 {
        return Err(InferenceError::NoSamples);
    }

    let domains = Arc::new(net.domains().restricted(evidence)?);
    let mut tally = Factor::new(
        query,
        &evidence.keys().map(String::as_str).collect::<Vec<_>>(),
        domains,
    )?;

    for _ in 0..samples {
        let mut sample = evidence.clone();
        let mut weight = 1.0;
        for variable in net.topological_order() {
            let cpt = net.cpt(variable).ok_or_else(|| InferenceError::UnknownVariable {
                variable: variable.clone(),
            })?;
            if evidence.contains_key(variable) {
                weight *= cpt.probability(&sample)?;
            } else {
                sample = sample_from_factor(cpt, Some(&sample), rng)?;
            }
        }
        if weight > 0.0 {
            let current = tally.probability(&sample)?;
            tally.set_probability(&sample, current + weight)?;
        }
    }

    if !(tally.total() > 0.0) {
        return Err(InferenceError::ZeroWeight);
    }
    Ok(normalize(&tally)?)
}

/// Checks the query against `net` and returns the variables to sum out, sorted.
fn hidden_variables(
    net: &BayesNet,
    query: &[&str],
    evidence: &Assignment,
) -> Result<BTreeSet<String>, InferenceError> {
    if query.is_empty() {
        return Err(InferenceError::EmptyQuery);
    }
    for variable in query {
        if !net.contains_variable(variable) {
            return Err(InferenceError::UnknownVariable {
                variable: variable.to_string(),
            });
        }
        if evidence.contains_key(*variable) {
            return Err(InferenceError::QueryEvidenceOverlap {
                variable: variable.to_string(),
            });
        }
    }
    for (variable, value) in evidence {
        let domain = net
            .domains()
            .get(variable)
            .filter(|_| net.contains_variable(variable))
            .ok_or_else(|| InferenceError::UnknownVariable {
                variable: variable.clone(),
            })?;
        if domain.index_of(value).is_none() {
            return Err(InferenceError::EvidenceOutsideDomain {
                variable: variable.clone(),
                value: *value,
            });
        }
    }

    Ok(net
        .variables()
        .iter()
        .filter(|variable| !query.contains(&variable.as_str()) && !evidence.contains_key(*variable))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::{AlgebraCall, Domains, assignment};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Cloudy -> Rain -> Wet <- Sprinkler <- Cloudy with textbook tables.
    fn sprinkler_net() -> BayesNet {
        let domains = Domains::new()
            .with("Cloudy", [true, false])
            .and_then(|d| d.with("Sprinkler", [true, false]))
            .and_then(|d| d.with("Rain", [true, false]))
            .and_then(|d| d.with("Wet", [true, false]))
            .expect("valid domains");
        let mut net = BayesNet::new(
            &["Cloudy", "Sprinkler", "Rain", "Wet"],
            &[
                ("Cloudy", "Sprinkler"),
                ("Cloudy", "Rain"),
                ("Sprinkler", "Wet"),
                ("Rain", "Wet"),
            ],
            domains,
        )
        .unwrap();

        let mut fill = |variable: &str, true_given: &dyn Fn(&Assignment) -> f64| {
            let mut cpt = net.cpt(variable).unwrap().clone();
            let rows: Vec<Assignment> = cpt.assignments().collect();
            for row in rows {
                let p_true = true_given(&row);
                let p = if row[variable] == Value::Bool(true) {
                    p_true
                } else {
                    1.0 - p_true
                };
                cpt.set_probability(&row, p).unwrap();
            }
            net.set_cpt(variable, cpt).unwrap();
        };
        let is = |row: &Assignment, name: &str| row[name] == Value::Bool(true);

        fill("Cloudy", &|_| 0.5);
        fill("Sprinkler", &|row| if is(row, "Cloudy") { 0.1 } else { 0.5 });
        fill("Rain", &|row| if is(row, "Cloudy") { 0.8 } else { 0.2 });
        fill("Wet", &|row| match (is(row, "Sprinkler"), is(row, "Rain")) {
            (true, true) => 0.99,
            (true, false) | (false, true) => 0.9,
            (false, false) => 0.0,
        });
        net
    }

    fn assert_factors_close(left: &Factor, right: &Factor, tolerance: f64) {
        assert_eq!(left.variables(), right.variables());
        assert_eq!(left.unconditioned_variables(), right.unconditioned_variables());
        for (row, probability) in left.rows() {
            let other = right.probability(&row).unwrap();
            assert!(
                (probability - other).abs() < tolerance,
                "{row:?}: {probability} vs {other}"
            );
        }
    }

    #[test]
    fn enumeration_matches_hand_computed_posterior() {
        let net = sprinkler_net();
        let evidence = assignment([("Wet", true)]);
        let posterior = inference_by_enumeration(&net, &["Rain"], &evidence).unwrap();
        let rain = posterior
            .probability(&assignment([("Rain", true), ("Wet", true)]))
            .unwrap();
        // P(Rain | Wet) = 0.4581 / 0.6471 for these tables.
        assert!((rain - 0.4581 / 0.6471).abs() < 1e-4, "{rain}");
        assert!(posterior.conditioned_variables().contains("Wet"));
    }

    #[test]
    fn elimination_agrees_with_enumeration_for_every_order() {
        let net = sprinkler_net();
        let evidence = assignment([("Wet", true)]);
        let reference = inference_by_enumeration(&net, &["Rain"], &evidence).unwrap();
        for order in [["Cloudy", "Sprinkler"], ["Sprinkler", "Cloudy"]] {
            let order: Vec<String> = order.iter().map(|v| v.to_string()).collect();
            let result =
                inference_by_variable_elimination(&net, &["Rain"], &evidence, Some(&order))
                    .unwrap();
            assert_factors_close(&reference, &result, 1e-12);
        }
    }

    #[test]
    fn elimination_interleaves_joins_and_eliminations() {
        let net = sprinkler_net();
        let mut log = CallLog::new();
        inference_by_variable_elimination_tracked(
            &net,
            &["Wet"],
            &Assignment::new(),
            None,
            Some(&mut log),
        )
        .unwrap();
        assert_eq!(
            log.calls(),
            &[
                AlgebraCall::Join("Cloudy".into()),
                AlgebraCall::Eliminate("Cloudy".into()),
                AlgebraCall::Join("Rain".into()),
                AlgebraCall::Eliminate("Rain".into()),
                AlgebraCall::Join("Sprinkler".into()),
                AlgebraCall::Eliminate("Sprinkler".into()),
            ]
        );
    }

    #[test]
    fn enumeration_joins_everything_before_eliminating() {
        let net = sprinkler_net();
        let mut log = CallLog::new();
        inference_by_enumeration_tracked(&net, &["Wet"], &Assignment::new(), Some(&mut log))
            .unwrap();
        let first_elimination = log
            .calls()
            .iter()
            .position(|call| matches!(call, AlgebraCall::Eliminate(_)))
            .unwrap();
        assert_eq!(first_elimination, 4);
        assert_eq!(log.eliminated(), vec!["Cloudy", "Rain", "Sprinkler"]);
    }

    #[test]
    fn rejects_malformed_queries() {
        let net = sprinkler_net();
        let empty = Assignment::new();
        assert_eq!(
            inference_by_enumeration(&net, &["Fog"], &empty).unwrap_err(),
            InferenceError::UnknownVariable {
                variable: "Fog".into()
            }
        );
        assert!(matches!(
            inference_by_enumeration(&net, &["Rain"], &assignment([("Rain", true)])),
            Err(InferenceError::QueryEvidenceOverlap { .. })
        ));
        assert!(matches!(
            inference_by_enumeration(&net, &["Rain"], &assignment([("Wet", 2)])),
            Err(InferenceError::EvidenceOutsideDomain { .. })
        ));
        let bad_order = vec!["Rain".to_string()];
        assert!(matches!(
            inference_by_variable_elimination(&net, &["Rain"], &empty, Some(&bad_order)),
            Err(InferenceError::InvalidEliminationOrder { .. })
        ));
        assert_eq!(
            inference_by_enumeration(&net, &[], &empty).unwrap_err(),
            InferenceError::EmptyQuery
        );
    }

    #[test]
    fn likelihood_weighting_approaches_exact_posterior() {
        let net = sprinkler_net();
        let evidence = assignment([("Wet", true)]);
        let exact = inference_by_enumeration(&net, &["Rain"], &evidence).unwrap();
        let mut rng = SmallRng::seed_from_u64(31);
        let approx =
            inference_by_likelihood_weighting(&net, &["Rain"], &evidence, 20_000, &mut rng)
                .unwrap();
        assert_factors_close(&exact, &approx, 0.02);
    }

    #[test]
    fn likelihood_weighting_needs_samples() {
        let net = sprinkler_net();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            inference_by_likelihood_weighting(&net, &["Rain"], &Assignment::new(), 0, &mut rng)
                .unwrap_err(),
            InferenceError::NoSamples
        );
    }
}
