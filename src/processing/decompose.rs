//! Range to CIDR decomposition.
//!
//! Splits an address interval into the unique minimal ordered list of
//! aligned power-of-two blocks covering exactly its addresses.

use crate::models::{IpAddress, IpRange, IpSubnetwork};

/// Decompose a range into CIDR subnetworks.
///
/// The blocks are pairwise disjoint, each a power of two in size, and
/// ordered by increasing base address; their union is exactly the range.
///
/// # Arguments
/// * `range` - The range to decompose
///
/// # Returns
/// The minimal list of subnetworks covering the range
pub fn range_to_subnets(range: &IpRange) -> Vec<IpSubnetwork> {
    let family = range.family();
    let total = family.total_bits();
    let low = range.first().value().expect("range bounds are exact");
    let high = range.last().value().expect("range bounds are exact");
    assert!(low <= high, "range bounds out of order should never happen");

    let mut subnets = Vec::new();
    let mut current = low;
    loop {
        let host_bits = widest_block(current, high, total);
        let base = IpAddress::from_value(family, current);
        let subnet = IpSubnetwork::new(base, (total - host_bits) as u8)
            .expect("block base is exact and the prefix is within the width");
        let block_last = subnet.last().value().expect("block bound is exact");
        subnets.push(subnet);
        if block_last >= high {
            break;
        }
        current = block_last + 1;
    }
    log::debug!("decomposed {} into {} subnets", range, subnets.len());
    subnets
}

/// Host-bit count of the largest CIDR block that starts at `current`
/// without breaking alignment or reaching past `high`.
fn widest_block(current: u128, high: u128, total_bits: u32) -> u32 {
    // The block cannot be larger than the power of two `current` is
    // aligned to (trailing zeros; the all-zero value is aligned to the
    // full width).
    let align = current.trailing_zeros().min(total_bits);
    // Nor may it contain more addresses than are left up to `high`.
    let span_bound = match (high - current).checked_add(1) {
        // The remaining span is the whole 2^128 space.
        None => total_bits,
        Some(span) => 128 - span.leading_zeros() - 1,
    };
    align.min(span_bound)
}
