//! Declarative per-field validation for resource payloads.
//!
//! Provides typed constraints, a rule set keyed by field name and a
//! pure-logic evaluator, all without database dependencies.

pub mod evaluator;
pub mod rules;

pub use evaluator::evaluate;
pub use rules::{
    violations_by_field, Constraint, FieldViolation, Pattern, RuleSet, ValidationResult,
};
