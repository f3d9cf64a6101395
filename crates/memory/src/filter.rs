//! The in-memory query dialect: direct filter evaluation.
//!
//! Where a database-backed implementation translates filters into its query
//! language, this backend evaluates them in-process against unwound result
//! rows. The semantics implemented here are the reference ones:
//!
//! - equality on binary and strings is byte-for-byte;
//! - equality on maps is submap containment: every pair of the filter's map
//!   must be present, with an equal value, in the field's map;
//! - integers compare numerically across widths and signedness;
//! - `in` tests membership among the sequence's elements;
//! - `matches` applies the regex unanchored, honoring the option flags;
//! - the bitwise operators treat both sides as 64-bit bit-vectors;
//! - ordering across kinds, or on regexes, sequences and maps, is undefined
//!   here and matches nothing (other backends may define it differently).
//!
//! A comparison on a field the row does not carry matches nothing.

use std::cmp::Ordering;

use regex::RegexBuilder;

use robinhood_core::{Error, Result};
use robinhood_model::{
    ComparisonOperator, Field, Filter, FilterError, FsEntry, LogicalOperator, RegexOptions,
    Statx, StatxMask, Value,
};

/// Evaluate `filter` against one unwound result row.
pub(crate) fn entry_matches(filter: &Filter, entry: &FsEntry) -> Result<bool> {
    match filter {
        Filter::Null => Ok(true),
        Filter::Logical { operator, filters } => match operator {
            LogicalOperator::And => {
                for filter in filters {
                    if !entry_matches(filter, entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalOperator::Or => {
                for filter in filters {
                    if entry_matches(filter, entry)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicalOperator::Not => match filters.as_slice() {
                [negated] => Ok(!entry_matches(negated, entry)?),
                others => Err(FilterError::NotArity(others.len()).into()),
            },
        },
        Filter::Comparison(compare) => {
            let Some(field_value) = field_value(entry, &compare.field) else {
                return Ok(false);
            };
            compare_values(compare.operator, &field_value, &compare.value)
        }
    }
}

fn timestamp(entry: &FsEntry, bit: StatxMask) -> Option<Value> {
    let statx = entry.statx.as_ref().filter(|statx| statx.mask.contains(bit))?;
    let seconds: i64 = if bit == StatxMask::ATIME {
        statx.atime.sec
    } else if bit == StatxMask::CTIME {
        statx.ctime.sec
    } else {
        statx.mtime.sec
    };
    Some(Value::Int64(seconds))
}

fn field_value(entry: &FsEntry, field: &Field) -> Option<Value> {
    match field {
        Field::Id => Some(Value::Binary(entry.id.as_bytes().to_vec())),
        Field::ParentId => entry
            .parent_id
            .as_ref()
            .map(|id| Value::Binary(id.as_bytes().to_vec())),
        Field::Name => entry.name.clone().map(Value::String),
        Field::Atime => timestamp(entry, StatxMask::ATIME),
        Field::Mtime => timestamp(entry, StatxMask::MTIME),
        Field::Ctime => timestamp(entry, StatxMask::CTIME),
        Field::Type => entry
            .statx
            .as_ref()
            .and_then(Statx::file_type)
            .map(|file_type| Value::UInt32(file_type.into())),
        Field::NamespaceXattr(key) => entry.ns_xattrs.as_ref()?.get(key).cloned(),
        Field::InodeXattr(key) => entry.xattrs.as_ref()?.get(key).cloned(),
    }
}

fn values_equal(field: &Value, value: &Value) -> bool {
    if field.is_integer() && value.is_integer() {
        return field.as_int() == value.as_int();
    }

    match (field, value) {
        (Value::Map(field_map), Value::Map(filter_map)) => filter_map
            .iter()
            .all(|(key, expected)| {
                field_map
                    .get(key)
                    .is_some_and(|actual| values_equal(actual, expected))
            }),
        (Value::Sequence(field_seq), Value::Sequence(filter_seq)) => {
            field_seq.len() == filter_seq.len()
                && field_seq
                    .iter()
                    .zip(filter_seq)
                    .all(|(actual, expected)| values_equal(actual, expected))
        }
        _ => field == value,
    }
}

fn values_order(field: &Value, value: &Value) -> Option<Ordering> {
    if field.is_integer() && value.is_integer() {
        return Some(field.as_int().cmp(&value.as_int()));
    }

    match (field, value) {
        (Value::String(field_str), Value::String(value_str)) => {
            Some(field_str.as_str().cmp(value_str.as_str()))
        }
        (Value::Binary(field_bytes), Value::Binary(value_bytes)) => {
            Some(field_bytes.as_slice().cmp(value_bytes.as_slice()))
        }
        _ => None,
    }
}

fn regex_matches(field: &Value, pattern: &str, options: RegexOptions) -> Result<bool> {
    let Value::String(string) = field else {
        return Ok(false);
    };

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(options.contains(RegexOptions::CASE_INSENSITIVE))
        .build()
        .map_err(|error| Error::invalid_input(format!("bad regex {pattern:?}: {error}")))?;

    Ok(regex.is_match(string))
}

fn compare_values(operator: ComparisonOperator, field: &Value, value: &Value) -> Result<bool> {
    let incompatible = || -> Error {
        FilterError::IncompatibleValue {
            operator,
            value_kind: value.kind(),
        }
        .into()
    };

    match operator {
        ComparisonOperator::Equal => Ok(values_equal(field, value)),
        ComparisonOperator::StrictlyLower => {
            Ok(values_order(field, value).is_some_and(Ordering::is_lt))
        }
        ComparisonOperator::LowerOrEqual => {
            Ok(values_order(field, value).is_some_and(Ordering::is_le))
        }
        ComparisonOperator::StrictlyGreater => {
            Ok(values_order(field, value).is_some_and(Ordering::is_gt))
        }
        ComparisonOperator::GreaterOrEqual => {
            Ok(values_order(field, value).is_some_and(Ordering::is_ge))
        }
        ComparisonOperator::Matches => match value {
            Value::Regex { pattern, options } => regex_matches(field, pattern, *options),
            _ => Err(incompatible()),
        },
        ComparisonOperator::In => match value {
            Value::Sequence(values) => {
                Ok(values.iter().any(|candidate| values_equal(field, candidate)))
            }
            _ => Err(incompatible()),
        },
        _ => {
            let (Some(field_bits), Some(value_bits)) = (field.as_bits(), value.as_bits()) else {
                return if value.as_bits().is_none() {
                    Err(incompatible())
                } else {
                    Ok(false)
                };
            };
            Ok(match operator {
                ComparisonOperator::BitsAnySet => field_bits & value_bits != 0,
                ComparisonOperator::BitsAllSet => field_bits & value_bits == value_bits,
                ComparisonOperator::BitsAnyClear => field_bits & value_bits != value_bits,
                _ => field_bits & value_bits == 0,
            })
        }
    }
}
