use super::error::FactorError;
use super::table::Factor;
use super::value::Assignment;
use rand::Rng;
use std::borrow::Cow;
use std::sync::Arc;

/// Draws an assignment of the unconditioned variables of `factor`.
///
/// `conditioned` must give a value to every conditioned variable of the
/// factor; it may be `None` only when there are none. Rows are drawn with
/// probability proportional to their entry. The returned assignment contains
/// the drawn row merged with `conditioned`.
pub fn sample_from_factor<R: Rng + ?Sized>(
    factor: &Factor,
    conditioned: Option<&Assignment>,
    rng: &mut R,
) -> Result<Assignment, FactorError> {
    let table = match conditioned {
        None if !factor.conditioned_variables().is_empty() => {
            return Err(FactorError::MissingEvidence {
                variables: factor.conditioned_variables().iter().cloned().collect(),
            });
        }
        None => Cow::Borrowed(factor),
        Some(given) => {
            let missing: Vec<String> = factor
                .conditioned_variables()
                .iter()
                .filter(|variable| !given.contains_key(*variable))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(FactorError::MissingEvidence { variables: missing });
            }

            let relevant: Assignment = given
                .iter()
                .filter(|(variable, _)| factor.contains_variable(variable))
                .map(|(variable, value)| (variable.clone(), *value))
                .collect();
            if relevant.is_empty() {
                Cow::Borrowed(factor)
            } else {
                let domains = factor.domains().restricted(&relevant)?;
                Cow::Owned(factor.specialize(Arc::new(domains))?)
            }
        }
    };

    let total = table.total();
    if !(total > 0.0) {
        return Err(FactorError::ZeroMass);
    }

    let pick = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut chosen = None;
    for (row, probability) in table.rows() {
        if probability <= 0.0 {
            continue;
        }
        cumulative += probability;
        chosen = Some(row);
        if pick < cumulative {
            break;
        }
    }

    let mut result = chosen.ok_or(FactorError::ZeroMass)?;
    if let Some(given) = conditioned {
        for (variable, value) in given {
            result.entry(variable.clone()).or_insert(*value);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::value::{Domains, Value, assignment};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn coin_given_bias() -> Factor {
        let domains = Arc::new(
            Domains::new()
                .with("Coin", ["heads", "tails"].map(|side| side == "heads"))
                .and_then(|d| d.with("Bias", [0, 1]))
                .expect("valid domains"),
        );
        let mut factor = Factor::new(&["Coin"], &["Bias"], domains).unwrap();
        for (coin, bias, probability) in [
            (true, 0, 0.5),
            (false, 0, 0.5),
            (true, 1, 0.9),
            (false, 1, 0.1),
        ] {
            factor
                .set_probability(
                    &assignment([("Coin", Value::Bool(coin)), ("Bias", Value::Int(bias))]),
                    probability,
                )
                .unwrap();
        }
        factor
    }

    #[test]
    fn requires_conditioning_values() {
        let factor = coin_given_bias();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            sample_from_factor(&factor, None, &mut rng),
            Err(FactorError::MissingEvidence { .. })
        ));
        let unrelated = assignment([("Other", 3)]);
        assert_eq!(
            sample_from_factor(&factor, Some(&unrelated), &mut rng),
            Err(FactorError::MissingEvidence {
                variables: vec!["Bias".into()]
            })
        );
    }

    #[test]
    fn draws_follow_conditional_row() {
        let factor = coin_given_bias();
        let mut rng = SmallRng::seed_from_u64(99);
        let given = assignment([("Bias", 1)]);
        let draws = 20_000;
        let heads = (0..draws)
            .filter(|_| {
                let sample = sample_from_factor(&factor, Some(&given), &mut rng).unwrap();
                assert_eq!(sample["Bias"], Value::Int(1));
                sample["Coin"] == Value::Bool(true)
            })
            .count();
        let frequency = heads as f64 / draws as f64;
        assert!((frequency - 0.9).abs() < 0.02, "frequency {frequency}");
    }
}
