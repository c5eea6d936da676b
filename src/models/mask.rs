//! Generalized bitmask match rules.

use crate::error::IpMatchError;
use crate::models::address::prefix_mask;
use crate::models::{Family, IpAddress, IpSubnetwork};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// An address plus an arbitrary (not necessarily contiguous) bitmask.
///
/// An address matches the mask when it agrees with the mask's address on
/// every 1-bit of the bitmask. The stored address is canonicalized by
/// AND-ing with the bitmask at construction, so two masks with the same
/// meaning compare equal regardless of the base address they were built
/// from. Equality is structural; two masks matching the same set through
/// different bit patterns are not equal.
#[derive(Debug, Clone)]
pub struct IpMask {
    address: IpAddress,
    mask: IpAddress,
    subnet: OnceLock<Option<IpSubnetwork>>,
}

impl IpMask {
    /// Create a mask from an exact address and exact bitmask of the same
    /// family. Address bits outside the mask are cleared.
    pub fn new(address: IpAddress, mask: IpAddress) -> Result<IpMask, IpMatchError> {
        if address.family() != mask.family() {
            return Err(IpMatchError::TypeMismatch {
                left: address.family(),
                right: mask.family(),
            });
        }
        let a = address
            .value()
            .ok_or(IpMatchError::WildcardAddress("mask address"))?;
        let m = mask
            .value()
            .ok_or(IpMatchError::WildcardAddress("mask bits"))?;
        Ok(IpMask::from_canonical(
            IpAddress::from_value(address.family(), a & m),
            mask,
        ))
    }

    /// Wrap an address/mask pair already known to be exact and canonical.
    pub(crate) fn from_canonical(address: IpAddress, mask: IpAddress) -> IpMask {
        debug_assert_eq!(
            address.value().map(|a| a & mask.value().unwrap_or(0)),
            address.value(),
            "address must be canonical"
        );
        IpMask {
            address,
            mask,
            subnet: OnceLock::new(),
        }
    }

    /// Rebuild a mask from numeric address and mask values.
    pub(crate) fn from_values(family: Family, address: u128, mask: u128) -> IpMask {
        IpMask::from_canonical(
            IpAddress::from_value(family, address & mask),
            IpAddress::from_value(family, mask),
        )
    }

    /// The address family.
    pub fn family(&self) -> Family {
        self.address.family()
    }

    /// The canonical address (bits outside the mask cleared).
    pub fn address(&self) -> &IpAddress {
        &self.address
    }

    /// The bitmask.
    pub fn mask(&self) -> &IpAddress {
        &self.mask
    }

    pub(crate) fn address_value(&self) -> u128 {
        self.address.value().expect("mask address is exact")
    }

    pub(crate) fn mask_value(&self) -> u128 {
        self.mask.value().expect("mask bits are exact")
    }

    /// Check whether the given address matches this mask.
    ///
    /// Wildcard addresses never match.
    pub fn matches(&self, ip: &IpAddress) -> bool {
        if ip.family() != self.family() {
            return false;
        }
        match ip.value() {
            Some(v) => v & self.mask_value() == self.address_value(),
            None => false,
        }
    }

    /// Number of addresses this mask matches: 2^(zero bits of the mask),
    /// saturating at `u128::MAX` for the match-everything IPv6 mask.
    pub fn amount(&self) -> u128 {
        let host_bits = self.host_bit_count();
        if host_bits >= 128 {
            u128::MAX
        } else {
            1u128 << host_bits
        }
    }

    /// Number of zero (don't care) bits in the mask.
    pub(crate) fn host_bit_count(&self) -> u32 {
        self.family().total_bits() - self.mask_value().count_ones()
    }

    /// Whether every address matched by `self` is also matched by
    /// `other`.
    ///
    /// # Errors
    /// Fails with [`IpMatchError::TypeMismatch`] when the families
    /// differ.
    pub fn is_subset_of(&self, other: &IpMask) -> Result<bool, IpMatchError> {
        if self.family() != other.family() {
            return Err(IpMatchError::TypeMismatch {
                left: self.family(),
                right: other.family(),
            });
        }
        if self == other {
            return Ok(true);
        }
        if self.host_bit_count() > other.host_bit_count() {
            // self matches more addresses than other, so it cannot fit.
            return Ok(false);
        }
        // Every bit other constrains must be constrained by self to the
        // same value; bits other leaves free are unconstrained.
        let required = other.mask_value();
        Ok(required & !self.mask_value() == 0
            && (self.address_value() ^ other.address_value()) & required == 0)
    }

    /// Convert to a subnetwork if the mask bits form a single contiguous
    /// run of 1s from the most significant bit.
    ///
    /// Returns `None` for non-contiguous masks like `255.0.255.0`; this
    /// is an expected outcome, not an error. Computed once and cached.
    pub fn convert_to_subnet(&self) -> Option<IpSubnetwork> {
        self.subnet
            .get_or_init(|| {
                let family = self.family();
                let total = family.total_bits();
                let aligned = self.mask_value() << (128 - total);
                let prefix = aligned.leading_ones().min(total) as u8;
                if self.mask_value() != prefix_mask(family, prefix).expect("prefix within width") {
                    return None;
                }
                Some(
                    IpSubnetwork::new(self.address.clone(), prefix)
                        .expect("canonical mask address is exact"),
                )
            })
            .clone()
    }

    /// Convert to a mask list: the mask itself.
    pub fn convert_to_masks(&self) -> Vec<IpMask> {
        vec![self.clone()]
    }
}

// Equality and hashing ignore the memoization cell.
impl PartialEq for IpMask {
    fn eq(&self, other: &IpMask) -> bool {
        self.address == other.address && self.mask == other.mask
    }
}

impl Eq for IpMask {}

impl std::hash::Hash for IpMask {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.mask.hash(state);
    }
}

impl fmt::Display for IpMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.mask)
    }
}

impl FromStr for IpMask {
    type Err = IpMatchError;

    /// Parses mask notation only (`address/maskAddress`); CIDR notation
    /// is [`IpSubnetwork`] territory.
    fn from_str(s: &str) -> Result<IpMask, IpMatchError> {
        match crate::parser::get_match(s)? {
            crate::models::IpMatch::Mask(mask) => Ok(mask),
            _ => Err(IpMatchError::Format {
                kind: "mask",
                input: s.to_string(),
            }),
        }
    }
}
