//! Inclusive address ranges.

use crate::error::IpMatchError;
use crate::models::{Family, IpAddress, IpMask, IpSubnetwork};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// An inclusive range between two exact addresses of the same family.
///
/// The CIDR decomposition of a range is computed once per instance and
/// cached; the cache is a write-once cell, so redundant computation
/// under concurrent access is harmless and callers always receive owned
/// copies.
#[derive(Debug, Clone)]
pub struct IpRange {
    first: IpAddress,
    last: IpAddress,
    subnets: OnceLock<Vec<IpSubnetwork>>,
    masks: OnceLock<Vec<IpMask>>,
}

impl IpRange {
    /// Create a range from two bounds of the same family.
    ///
    /// Wildcard bounds are resolved to the widest interval they imply:
    /// wildcards in `left` drop to the part minimum, wildcards in
    /// `right` rise to the part maximum. The resolved bounds must be in
    /// order.
    pub fn new(left: IpAddress, right: IpAddress) -> Result<IpRange, IpMatchError> {
        if left.family() != right.family() {
            return Err(IpMatchError::TypeMismatch {
                left: left.family(),
                right: right.family(),
            });
        }
        let first = left.lower_bound();
        let last = right.upper_bound();
        if first.value() > last.value() {
            return Err(IpMatchError::RangeOrder {
                low: first.to_string(),
                high: last.to_string(),
            });
        }
        Ok(IpRange::from_bounds(first, last))
    }

    /// Build a range from bounds already known to be exact and ordered.
    pub(crate) fn from_bounds(first: IpAddress, last: IpAddress) -> IpRange {
        debug_assert!(first.is_exact() && last.is_exact());
        debug_assert!(first.value() <= last.value());
        IpRange {
            first,
            last,
            subnets: OnceLock::new(),
            masks: OnceLock::new(),
        }
    }

    /// The address family.
    pub fn family(&self) -> Family {
        self.first.family()
    }

    /// The first address in the range.
    pub fn first(&self) -> &IpAddress {
        &self.first
    }

    /// The last address in the range.
    pub fn last(&self) -> &IpAddress {
        &self.last
    }

    /// Check whether the given address lies in the range (inclusive).
    ///
    /// Wildcard addresses never match.
    pub fn matches(&self, ip: &IpAddress) -> bool {
        if ip.family() != self.family() {
            return false;
        }
        match ip.value() {
            Some(v) => {
                self.first.value().expect("bounds are exact") <= v
                    && v <= self.last.value().expect("bounds are exact")
            }
            None => false,
        }
    }

    /// Number of addresses in the range, saturating at `u128::MAX` for
    /// the full IPv6 space.
    pub fn amount(&self) -> u128 {
        let first = self.first.value().expect("bounds are exact");
        let last = self.last.value().expect("bounds are exact");
        (last - first).saturating_add(1)
    }

    /// Decompose the range into the minimal ordered list of CIDR
    /// subnetworks covering exactly its addresses.
    ///
    /// Computed once and cached; the returned vector is the caller's to
    /// mutate.
    pub fn convert_to_subnets(&self) -> Vec<IpSubnetwork> {
        self.subnets
            .get_or_init(|| crate::processing::range_to_subnets(self))
            .clone()
    }

    /// Convert the range to an equivalent list of masks, one per CIDR
    /// block of [`IpRange::convert_to_subnets`], in the same order.
    pub fn convert_to_masks(&self) -> Vec<IpMask> {
        self.masks
            .get_or_init(|| {
                self.convert_to_subnets()
                    .iter()
                    .flat_map(|s| s.convert_to_masks())
                    .collect()
            })
            .clone()
    }
}

// Equality and hashing ignore the memoization cells.
impl PartialEq for IpRange {
    fn eq(&self, other: &IpRange) -> bool {
        self.first == other.first && self.last == other.last
    }
}

impl Eq for IpRange {}

impl std::hash::Hash for IpRange {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.first.hash(state);
        self.last.hash(state);
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

impl FromStr for IpRange {
    type Err = IpMatchError;

    fn from_str(s: &str) -> Result<IpRange, IpMatchError> {
        match crate::parser::get_match(s)? {
            crate::models::IpMatch::Range(range) => Ok(range),
            _ => Err(IpMatchError::Format {
                kind: "range",
                input: s.to_string(),
            }),
        }
    }
}
