//! Mask collection compaction.
//!
//! Reduces a list of masks to an equivalent, never larger list by
//! repeatedly applying two pairwise rules until nothing combines.

use crate::models::IpMask;
use std::collections::VecDeque;

/// Compact a list of masks into an equivalent list.
///
/// Two reduction rules are tried in order against every accumulated
/// result:
/// 1. subsumption - when one mask matches a subset of the other, only
///    the superset survives;
/// 2. single-bit merge - two masks with the identical bit pattern whose
///    addresses differ in exactly one masked bit become one mask with
///    that bit turned into a don't-care.
///
/// A survivor re-enters the work queue so it can keep combining with the
/// remaining results. Masks of different families never combine. The
/// output order is not significant; the contract is that the union of
/// matched addresses is unchanged.
pub fn compact_masks(masks: &[IpMask]) -> Vec<IpMask> {
    if masks.len() < 2 {
        return masks.to_vec();
    }
    let mut queue: VecDeque<IpMask> = masks.iter().cloned().collect();
    let mut results: Vec<IpMask> = Vec::new();
    'next_mask: while let Some(mask) = queue.pop_front() {
        for i in 0..results.len() {
            if let Some(combined) = try_combine(&mask, &results[i]) {
                results.remove(i);
                queue.push_back(combined);
                continue 'next_mask;
            }
        }
        // Did not combine with any previous result.
        results.push(mask);
    }
    log::debug!("compacted {} masks to {}", masks.len(), results.len());
    results
}

/// Try the reduction rules in order; subsumption comes first so the
/// merge only sees genuinely different same-shaped masks.
fn try_combine(a: &IpMask, b: &IpMask) -> Option<IpMask> {
    if a.family() != b.family() {
        return None;
    }
    subsume(a, b).or_else(|| merge_single_bit(a, b))
}

/// The surviving superset when one mask subsumes the other.
fn subsume(a: &IpMask, b: &IpMask) -> Option<IpMask> {
    // Families are equal here, so the subset test cannot fail.
    if a.is_subset_of(b).unwrap_or(false) {
        return Some(b.clone());
    }
    if b.is_subset_of(a).unwrap_or(false) {
        return Some(a.clone());
    }
    None
}

/// Merge two masks with the same bit pattern whose addresses differ in
/// exactly one bit, clearing that bit in the pattern.
fn merge_single_bit(a: &IpMask, b: &IpMask) -> Option<IpMask> {
    if a.mask() != b.mask() {
        return None;
    }
    // Canonical addresses agree outside the mask, so any difference is
    // on a masked bit.
    let diff = a.address_value() ^ b.address_value();
    if diff.count_ones() != 1 {
        return None;
    }
    let merged_mask = a.mask_value() & !diff;
    Some(IpMask::from_values(
        a.family(),
        a.address_value() & merged_mask,
        merged_mask,
    ))
}
