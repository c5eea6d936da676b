//! Error types for address parsing and value construction.

use crate::models::Family;
use thiserror::Error;

/// Errors produced while parsing text or constructing address values.
///
/// All validation happens at construction time; the algorithms
/// (decomposition, compaction) assume well-formed inputs and never
/// produce these themselves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IpMatchError {
    /// Text does not match the expected shape for the requested type.
    #[error("invalid {kind} format: {input:?}")]
    Format {
        /// What was being parsed ("address", "range", "pattern", ...)
        kind: &'static str,
        /// The offending input text
        input: String,
    },

    /// Operands mix IPv4 and IPv6 where matching families are required.
    #[error("expected matching address families, got {left} and {right}")]
    TypeMismatch {
        /// Family of the left operand
        left: Family,
        /// Family of the right operand
        right: Family,
    },

    /// A range was constructed with its bounds out of order.
    #[error("range bounds out of order: {low} comes after {high}")]
    RangeOrder {
        /// Rendered lower bound
        low: String,
        /// Rendered upper bound
        high: String,
    },

    /// A bit slice had a length other than 32 or 128, or a part mixed
    /// wildcard and exact bits.
    #[error("expected 32 or 128 well-formed bits, got {0}")]
    Shape(usize),

    /// Prefix length beyond the total bit width of the family.
    #[error("prefix length {prefix} out of range for {family}")]
    PrefixLength {
        /// The rejected prefix length
        prefix: u8,
        /// Family the prefix was applied to
        family: Family,
    },

    /// An operation requiring an exact address received a wildcard.
    #[error("{0} requires an exact address, got a wildcard")]
    WildcardAddress(&'static str),
}
