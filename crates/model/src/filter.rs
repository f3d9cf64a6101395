//! Predicate trees over filesystem entries.
//!
//! There are two kinds of filter nodes: comparison filters, which pair a
//! field with an operator and a value ("the entry's name matches `.*\.c`"),
//! and logical filters, which combine other filters with and/or/not.
//!
//! The match-all filter `Filter::Null` is a sentinel: on its own it accepts
//! every entry, and `not [Null]` is the canonical filter that accepts none.
//!
//! Filters are immutable once built. The typed constructors reject invalid
//! operator/value pairings up front; `validate` re-checks whole trees that
//! were assembled some other way (deserialized, hand-built) before a backend
//! translates them.
//!
//! Valid combinations of comparison operator and value kind:
//!
//! | kind     | equal | lower/greater | matches | in | bits |
//! |----------|-------|---------------|---------|----|------|
//! | binary   | x     | x             |         |    |      |
//! | integers | x     | x             |         |    | x    |
//! | string   | x     | x             |         |    |      |
//! | regex    | x     | x             | x       |    |      |
//! | sequence | x     | x             |         | x  |      |
//! | map      | x     | x             |         |    |      |
//!
//! Ordering operators on non-integer kinds are accepted but their meaning is
//! backend-defined; do not rely on cross-backend consistency.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::id::Id;
use crate::value::{RegexOptions, Value, ValueMap};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,
    StrictlyLower,
    LowerOrEqual,
    StrictlyGreater,
    GreaterOrEqual,
    /// Regex match; the value must be a regex.
    Matches,
    /// Membership; the value must be a sequence.
    In,
    BitsAnySet,
    BitsAllSet,
    BitsAnyClear,
    BitsAllClear,
}

impl ComparisonOperator {
    /// Every comparison operator, in declaration order.
    pub const ALL: [ComparisonOperator; 11] = [
        ComparisonOperator::Equal,
        ComparisonOperator::StrictlyLower,
        ComparisonOperator::LowerOrEqual,
        ComparisonOperator::StrictlyGreater,
        ComparisonOperator::GreaterOrEqual,
        ComparisonOperator::Matches,
        ComparisonOperator::In,
        ComparisonOperator::BitsAnySet,
        ComparisonOperator::BitsAllSet,
        ComparisonOperator::BitsAnyClear,
        ComparisonOperator::BitsAllClear,
    ];

    /// Check whether this is one of the four bitwise operators.
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::BitsAnySet
                | ComparisonOperator::BitsAllSet
                | ComparisonOperator::BitsAnyClear
                | ComparisonOperator::BitsAllClear
        )
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

/// The entry field a comparison applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Id,
    ParentId,
    Atime,
    Mtime,
    Ctime,
    Name,
    /// The file type bits of the entry's mode.
    Type,
    /// A named xattr on the namespace edge the entry was reached through.
    NamespaceXattr(String),
    /// A named xattr on the inode itself (shared by every hardlink).
    InodeXattr(String),
}

/// A single predicate: field, operator, value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub operator: ComparisonOperator,
    pub field: Field,
    pub value: Value,
}

/// An immutable predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// The match-all sentinel. Only valid at the root of a tree (or as the
    /// sole child of a root-level `not`).
    Null,
    Comparison(Comparison),
    Logical {
        operator: LogicalOperator,
        filters: Vec<Filter>,
    },
}

fn operator_matches_value(
    operator: ComparisonOperator,
    value: &Value,
) -> Result<(), FilterError> {
    let compatible = match operator {
        ComparisonOperator::In => matches!(value, Value::Sequence(_)),
        ComparisonOperator::Matches => matches!(value, Value::Regex { .. }),
        op if op.is_bitwise() => value.is_integer(),
        _ => true,
    };

    if compatible {
        Ok(())
    } else {
        Err(FilterError::IncompatibleValue {
            operator,
            value_kind: value.kind(),
        })
    }
}

impl Filter {
    /// Create a comparison filter.
    ///
    /// # Errors
    /// Returns `FilterError::IncompatibleValue` if `operator` cannot be
    /// applied to `value`'s kind.
    pub fn compare(
        operator: ComparisonOperator,
        field: Field,
        value: Value,
    ) -> Result<Self, FilterError> {
        operator_matches_value(operator, &value)?;
        Ok(Filter::Comparison(Comparison {
            operator,
            field,
            value,
        }))
    }

    /// Compare a field to raw bytes.
    pub fn compare_binary(
        operator: ComparisonOperator,
        field: Field,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::Binary(data.into()))
    }

    /// Compare a field to an entry id.
    pub fn compare_id(
        operator: ComparisonOperator,
        field: Field,
        id: &Id,
    ) -> Result<Self, FilterError> {
        Self::compare_binary(operator, field, id.as_bytes().to_vec())
    }

    /// Compare a field to a `u32`.
    pub fn compare_u32(
        operator: ComparisonOperator,
        field: Field,
        n: u32,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::UInt32(n))
    }

    /// Compare a field to a `u64`.
    pub fn compare_u64(
        operator: ComparisonOperator,
        field: Field,
        n: u64,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::UInt64(n))
    }

    /// Compare a field to an `i32`.
    pub fn compare_i32(
        operator: ComparisonOperator,
        field: Field,
        n: i32,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::Int32(n))
    }

    /// Compare a field to an `i64`.
    pub fn compare_i64(
        operator: ComparisonOperator,
        field: Field,
        n: i64,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::Int64(n))
    }

    /// Compare a field to a string.
    pub fn compare_string(
        operator: ComparisonOperator,
        field: Field,
        string: impl Into<String>,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::String(string.into()))
    }

    /// Match a field against a regex. Matching is not anchored; anchor the
    /// pattern if that is what you mean.
    pub fn compare_regex(
        field: Field,
        pattern: impl Into<String>,
        options: RegexOptions,
    ) -> Result<Self, FilterError> {
        Self::compare(
            ComparisonOperator::Matches,
            field,
            Value::regex(pattern, options),
        )
    }

    /// Compare a field to a sequence of values.
    pub fn compare_sequence(
        operator: ComparisonOperator,
        field: Field,
        values: impl Into<Vec<Value>>,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::Sequence(values.into()))
    }

    /// Compare a field to a map of values.
    pub fn compare_map(
        operator: ComparisonOperator,
        field: Field,
        map: ValueMap,
    ) -> Result<Self, FilterError> {
        Self::compare(operator, field, Value::Map(map))
    }

    fn logical(
        operator: LogicalOperator,
        filters: &[&Filter],
    ) -> Result<Self, FilterError> {
        if filters.is_empty() {
            return Err(FilterError::EmptyLogical);
        }
        Ok(Filter::Logical {
            operator,
            filters: filters.iter().map(|filter| (*filter).clone()).collect(),
        })
    }

    /// AND several filters together. The children are deep-copied; the
    /// returned tree is the sole owner of its nodes.
    pub fn and(filters: &[&Filter]) -> Result<Self, FilterError> {
        Self::logical(LogicalOperator::And, filters)
    }

    /// OR several filters together. The children are deep-copied; the
    /// returned tree is the sole owner of its nodes.
    pub fn or(filters: &[&Filter]) -> Result<Self, FilterError> {
        Self::logical(LogicalOperator::Or, filters)
    }

    /// Negate a filter.
    pub fn not(filter: &Filter) -> Self {
        Filter::Logical {
            operator: LogicalOperator::Not,
            filters: vec![filter.clone()],
        }
    }

    /// The filter that matches nothing: `not [Null]`.
    pub fn none() -> Self {
        Filter::not(&Filter::Null)
    }

    /// Check whether any comparison in the tree references a namespace
    /// field (parent id, name, or a namespace xattr).
    ///
    /// Backends may skip the namespace unwind stage of their query pipeline
    /// when this is false.
    pub fn references_namespace(&self) -> bool {
        match self {
            Filter::Null => false,
            Filter::Comparison(compare) => matches!(
                compare.field,
                Field::ParentId | Field::Name | Field::NamespaceXattr(_)
            ),
            Filter::Logical { filters, .. } => {
                filters.iter().any(Filter::references_namespace)
            }
        }
    }

    /// Validate a whole tree.
    ///
    /// Structural rules: `not` has exactly one child, `and`/`or` have at
    /// least one, and `Null` only appears at the root (alone, or as the sole
    /// child of a root-level `not`). Comparisons must pair operators and
    /// value kinds per the compatibility table.
    ///
    /// # Errors
    /// Returns the `FilterError` describing the offending node.
    pub fn validate(&self) -> Result<(), FilterError> {
        // `not [Null]` is the canonical "matches nothing" filter; it is only
        // recognized at the root.
        if let Filter::Logical {
            operator: LogicalOperator::Not,
            filters,
        } = self
        {
            if filters.len() == 1 && filters[0] == Filter::Null {
                return Ok(());
            }
        }

        match self {
            Filter::Null => Ok(()),
            _ => self.validate_node(),
        }
    }

    fn validate_node(&self) -> Result<(), FilterError> {
        match self {
            Filter::Null => Err(FilterError::MisplacedNull),
            Filter::Comparison(compare) => {
                operator_matches_value(compare.operator, &compare.value)
            }
            Filter::Logical { operator, filters } => {
                match operator {
                    LogicalOperator::Not if filters.len() != 1 => {
                        return Err(FilterError::NotArity(filters.len()));
                    }
                    _ if filters.is_empty() => return Err(FilterError::EmptyLogical),
                    _ => {}
                }
                for filter in filters {
                    filter.validate_node()?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_value(kind: &str) -> Value {
        match kind {
            "binary" => Value::Binary(vec![1, 2, 3]),
            "int32" => Value::Int32(-5),
            "uint32" => Value::UInt32(5),
            "int64" => Value::Int64(-5),
            "uint64" => Value::UInt64(5),
            "string" => Value::from("foo"),
            "regex" => Value::regex("fo+", RegexOptions::empty()),
            "sequence" => Value::Sequence(vec![Value::from("foo")]),
            "map" => Value::Map(ValueMap::new()),
            other => panic!("unknown value kind {other}"),
        }
    }

    /// Mirror of the operator/value compatibility table.
    fn expect_compatible(operator: ComparisonOperator, kind: &str) -> bool {
        let integer: bool = matches!(kind, "int32" | "uint32" | "int64" | "uint64");
        match operator {
            ComparisonOperator::Matches => kind == "regex",
            ComparisonOperator::In => kind == "sequence",
            op if op.is_bitwise() => integer,
            _ => true,
        }
    }

    #[test]
    fn test_builders_follow_compatibility_table() {
        let kinds: [&str; 9] = [
            "binary", "int32", "uint32", "int64", "uint64", "string", "regex",
            "sequence", "map",
        ];

        for operator in ComparisonOperator::ALL {
            for kind in kinds {
                let result = Filter::compare(operator, Field::Name, sample_value(kind));
                assert_eq!(
                    result.is_ok(),
                    expect_compatible(operator, kind),
                    "operator {operator:?} with {kind} value"
                );
                if let Ok(filter) = result {
                    assert_eq!(filter.validate(), Ok(()));
                }
            }
        }
    }

    #[test]
    fn test_incompatible_pairing_is_reported() {
        let err = Filter::compare_string(ComparisonOperator::In, Field::Name, "foo")
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::IncompatibleValue {
                operator: ComparisonOperator::In,
                value_kind: "string",
            }
        );
    }

    #[test]
    fn test_logical_builders_deep_copy() {
        let name = Filter::compare_string(ComparisonOperator::Equal, Field::Name, "foo.c")
            .unwrap();
        let mtime = Filter::compare_u64(
            ComparisonOperator::GreaterOrEqual,
            Field::Mtime,
            1_700_000_000,
        )
        .unwrap();

        let and: Filter = Filter::and(&[&name, &mtime]).unwrap();
        assert_eq!(and.validate(), Ok(()));

        // The originals are still usable; the tree owns its own copies.
        drop(name);
        drop(mtime);
        match and {
            Filter::Logical { operator, filters } => {
                assert_eq!(operator, LogicalOperator::And);
                assert_eq!(filters.len(), 2);
            }
            other => panic!("expected a logical filter, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_logical_is_rejected() {
        assert_eq!(Filter::and(&[]), Err(FilterError::EmptyLogical));
        assert_eq!(Filter::or(&[]), Err(FilterError::EmptyLogical));
    }

    #[test]
    fn test_not_arity_is_checked() {
        let child = Filter::compare_u32(ComparisonOperator::Equal, Field::Type, 0o100000)
            .unwrap();
        let two_children: Filter = Filter::Logical {
            operator: LogicalOperator::Not,
            filters: vec![child.clone(), child],
        };
        assert_eq!(two_children.validate(), Err(FilterError::NotArity(2)));
    }

    #[test]
    fn test_null_placement() {
        assert_eq!(Filter::Null.validate(), Ok(()));
        assert_eq!(Filter::none().validate(), Ok(()));

        let buried: Filter = Filter::Logical {
            operator: LogicalOperator::And,
            filters: vec![Filter::Null],
        };
        assert_eq!(buried.validate(), Err(FilterError::MisplacedNull));
    }

    #[test]
    fn test_namespace_references() {
        let name = Filter::compare_string(ComparisonOperator::Equal, Field::Name, "x")
            .unwrap();
        let size = Filter::compare_u64(ComparisonOperator::StrictlyGreater, Field::Mtime, 0)
            .unwrap();

        assert!(name.references_namespace());
        assert!(!size.references_namespace());
        assert!(Filter::and(&[&size, &name]).unwrap().references_namespace());
        assert!(!Filter::Null.references_namespace());
    }

    #[test]
    fn test_validate_rebuilt_tree() {
        // A tree assembled by hand, bypassing the builders.
        let bad: Filter = Filter::Comparison(Comparison {
            operator: ComparisonOperator::BitsAllSet,
            field: Field::Mtime,
            value: Value::from("not an integer"),
        });
        assert_eq!(
            bad.validate(),
            Err(FilterError::IncompatibleValue {
                operator: ComparisonOperator::BitsAllSet,
                value_kind: "string",
            })
        );
    }
}
