//! Discrete factors and the algebra used for exact inference.
//!
//! This module is composed of:
//! - `value`: variable values, domains and assignments.
//! - `table`: the dense [`Factor`] table itself.
//! - `ops`: join, eliminate and normalize, with optional call tracking.
//! - `sample`: drawing assignments from a (conditional) factor.

mod error;
mod ops;
mod sample;
mod table;
mod value;

pub use error::FactorError;
pub use ops::{
    AlgebraCall, CallLog, eliminate, eliminate_tracked, join_factors, join_factors_by_variable,
    join_factors_by_variable_tracked, normalize,
};
pub use sample::sample_from_factor;
pub use table::{Assignments, Factor};
pub use value::{Assignment, Domain, Domains, Value, assignment};
