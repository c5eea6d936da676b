//! CIDR subnetworks.

use crate::error::IpMatchError;
use crate::models::address::{family_mask, prefix_mask};
use crate::models::{Family, IpAddress, IpMask, IpRange};
use std::fmt;
use std::str::FromStr;

/// A CIDR subnetwork: a canonical base address plus a prefix length.
///
/// The base is canonicalized at construction by clearing every bit
/// beyond the prefix, so `10.20.30.40/16` and `10.20.0.0/16` are the
/// same subnetwork.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpSubnetwork {
    base: IpAddress,
    prefix: u8,
}

impl IpSubnetwork {
    /// Create a subnetwork from an exact base address and prefix length.
    ///
    /// The prefix has to be in the range 0-32 for IPv4 and 0-128 for
    /// IPv6.
    pub fn new(ip: IpAddress, prefix: u8) -> Result<IpSubnetwork, IpMatchError> {
        let family = ip.family();
        let mask = prefix_mask(family, prefix)?;
        let value = ip
            .value()
            .ok_or(IpMatchError::WildcardAddress("subnetwork base"))?;
        Ok(IpSubnetwork {
            base: IpAddress::from_value(family, value & mask),
            prefix,
        })
    }

    /// The address family.
    pub fn family(&self) -> Family {
        self.base.family()
    }

    /// The prefix length.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// The canonical base (network) address.
    pub fn base(&self) -> &IpAddress {
        &self.base
    }

    /// The first address in the subnetwork (same as the base).
    pub fn first(&self) -> IpAddress {
        self.base.clone()
    }

    /// The last address in the subnetwork (all host bits set).
    pub fn last(&self) -> IpAddress {
        let family = self.family();
        IpAddress::from_value(family, self.base_value() | self.host_mask())
    }

    /// The equivalent inclusive address range.
    pub fn to_range(&self) -> IpRange {
        IpRange::from_bounds(self.first(), self.last())
    }

    /// Check whether the given address lies in this subnetwork.
    ///
    /// Wildcard addresses never match.
    pub fn matches(&self, ip: &IpAddress) -> bool {
        if ip.family() != self.family() {
            return false;
        }
        match ip.value() {
            Some(v) => v & !self.host_mask() == self.base_value(),
            None => false,
        }
    }

    /// Number of addresses in the subnetwork, saturating at `u128::MAX`
    /// for the full IPv6 space (`::/0`).
    pub fn amount(&self) -> u128 {
        let host_bits = self.family().total_bits() - u32::from(self.prefix);
        if host_bits >= 128 {
            u128::MAX
        } else {
            1u128 << host_bits
        }
    }

    /// Convert to the equivalent single-element mask list.
    pub fn convert_to_masks(&self) -> Vec<IpMask> {
        let family = self.family();
        let mask = IpAddress::from_value(family, !self.host_mask() & family_mask(family));
        vec![IpMask::from_canonical(self.base.clone(), mask)]
    }

    fn base_value(&self) -> u128 {
        self.base.value().expect("canonical base is exact")
    }

    fn host_mask(&self) -> u128 {
        let family = self.family();
        family_mask(family)
            & !prefix_mask(family, self.prefix).expect("prefix validated at construction")
    }
}

impl fmt::Display for IpSubnetwork {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}

impl FromStr for IpSubnetwork {
    type Err = IpMatchError;

    /// Parses CIDR notation only; mask notation is [`IpMask`] territory.
    fn from_str(s: &str) -> Result<IpSubnetwork, IpMatchError> {
        match crate::parser::get_match(s)? {
            crate::models::IpMatch::Subnetwork(subnet) => Ok(subnet),
            _ => Err(IpMatchError::Format {
                kind: "subnetwork",
                input: s.to_string(),
            }),
        }
    }
}
