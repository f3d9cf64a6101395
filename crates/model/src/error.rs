//! Error types for filter construction and validation.

use thiserror::Error;

use crate::filter::ComparisonOperator;

/// Why a filter (or one of its nodes) is invalid.
///
/// Builders report these at construction time; `Filter::validate` reports
/// them for trees assembled by other means (deserialization, manual
/// construction).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The comparison operator cannot be applied to this kind of value.
    #[error("operator {operator:?} cannot compare a field to a {value_kind} value")]
    IncompatibleValue {
        /// The offending operator.
        operator: ComparisonOperator,
        /// The kind of the value it was paired with.
        value_kind: &'static str,
    },

    /// A logical node with no children.
    #[error("logical filters require at least one child")]
    EmptyLogical,

    /// `not` with a child count other than one.
    #[error("`not` takes exactly one child, got {0}")]
    NotArity(usize),

    /// The match-all filter used somewhere other than the root.
    #[error("the match-all filter is only valid at the root")]
    MisplacedNull,
}
