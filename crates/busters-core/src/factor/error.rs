use super::value::Value;
use std::fmt;

/// Errors raised while building or combining factors.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorError {
    OverlappingVariables { variable: String },
    MissingDomain { variable: String },
    EmptyDomain { variable: String },
    DuplicateValue { variable: String, value: Value },
    ValueOutsideDomain { variable: String, value: Value },
    MissingAssignment { variable: String },
    NegativeProbability { value: f64 },
    EmptyJoin,
    DuplicateUnconditioned { variables: Vec<String> },
    AmbiguousJoinVariable { variable: String, factors: usize },
    NoFactorMentions { variable: String },
    NotUnconditioned { variable: String },
    SoleUnconditioned { variable: String },
    MissingEvidence { variables: Vec<String> },
    AmbiguousCondition { variable: String },
    ZeroMass,
}

impl fmt::Display for FactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorError::OverlappingVariables { variable } => {
                write!(f, "{variable} cannot be both unconditioned and conditioned")
            }
            FactorError::MissingDomain { variable } => {
                write!(f, "no domain registered for {variable}")
            }
            FactorError::EmptyDomain { variable } => write!(f, "domain of {variable} is empty"),
            FactorError::DuplicateValue { variable, value } => {
                write!(f, "domain of {variable} lists {value} more than once")
            }
            FactorError::ValueOutsideDomain { variable, value } => {
                write!(f, "{value} is not in the domain of {variable}")
            }
            FactorError::MissingAssignment { variable } => {
                write!(f, "assignment does not give a value for {variable}")
            }
            FactorError::NegativeProbability { value } => {
                write!(f, "probability {value} is negative or not a number")
            }
            FactorError::EmptyJoin => write!(f, "cannot join an empty list of factors"),
            FactorError::DuplicateUnconditioned { variables } => write!(
                f,
                "unconditioned variables {} appear in more than one input factor",
                variables.join(", ")
            ),
            FactorError::AmbiguousJoinVariable { variable, factors } => write!(
                f,
                "join variable {variable} is unconditioned in {factors} factors; at most one allowed"
            ),
            FactorError::NoFactorMentions { variable } => {
                write!(f, "no factor mentions join variable {variable}")
            }
            FactorError::NotUnconditioned { variable } => {
                write!(f, "{variable} is not an unconditioned variable of the factor")
            }
            FactorError::SoleUnconditioned { variable } => write!(
                f,
                "{variable} is the only unconditioned variable and cannot be eliminated"
            ),
            FactorError::MissingEvidence { variables } => write!(
                f,
                "conditioned variables {} need an assigned value",
                variables.join(", ")
            ),
            FactorError::AmbiguousCondition { variable } => write!(
                f,
                "conditioned variable {variable} must have a single value to normalize"
            ),
            FactorError::ZeroMass => write!(f, "factor has zero total probability"),
        }
    }
}

impl std::error::Error for FactorError {}
