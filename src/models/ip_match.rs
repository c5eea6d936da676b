//! The closed union over every kind of match pattern.

use crate::error::IpMatchError;
use crate::models::{Family, IpAddress, IpMask, IpRange, IpSubnetwork};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Any pattern an address can be matched against: a (possibly wildcard)
/// address, a range, a CIDR subnetwork or a generalized mask.
///
/// This is what [`crate::parser::get_match`] returns, dispatching on the
/// textual shape of its input. Equality requires the same pattern kind:
/// the address `10.0.0.0` and the subnetwork `10.0.0.0/32` match the
/// same single address but are not equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IpMatch {
    /// A single address, possibly containing wildcard parts.
    Address(IpAddress),
    /// An inclusive range between two addresses.
    Range(IpRange),
    /// A CIDR subnetwork.
    Subnetwork(IpSubnetwork),
    /// A generalized bitmask rule.
    Mask(IpMask),
}

impl IpMatch {
    /// A short label for the pattern kind, e.g. for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            IpMatch::Address(ip) => match ip.family() {
                Family::V4 => "IPv4",
                Family::V6 => "IPv6",
            },
            IpMatch::Range(_) => "IPRange",
            IpMatch::Subnetwork(_) => "IPSubnetwork",
            IpMatch::Mask(_) => "IPMask",
        }
    }

    /// The address family of the pattern.
    pub fn family(&self) -> Family {
        match self {
            IpMatch::Address(ip) => ip.family(),
            IpMatch::Range(range) => range.family(),
            IpMatch::Subnetwork(subnet) => subnet.family(),
            IpMatch::Mask(mask) => mask.family(),
        }
    }

    /// Check whether the given address matches this pattern.
    pub fn matches(&self, ip: &IpAddress) -> bool {
        match self {
            IpMatch::Address(pattern) => pattern.matches(ip),
            IpMatch::Range(range) => range.matches(ip),
            IpMatch::Subnetwork(subnet) => subnet.matches(ip),
            IpMatch::Mask(mask) => mask.matches(ip),
        }
    }

    /// Convert this pattern to a list of masks matching the same
    /// addresses.
    pub fn convert_to_masks(&self) -> Vec<IpMask> {
        match self {
            IpMatch::Address(ip) => ip.convert_to_masks(),
            IpMatch::Range(range) => range.convert_to_masks(),
            IpMatch::Subnetwork(subnet) => subnet.convert_to_masks(),
            IpMatch::Mask(mask) => mask.convert_to_masks(),
        }
    }

    /// Number of distinct addresses this pattern matches, saturating at
    /// `u128::MAX`.
    pub fn amount(&self) -> u128 {
        match self {
            IpMatch::Address(ip) => ip.amount(),
            IpMatch::Range(range) => range.amount(),
            IpMatch::Subnetwork(subnet) => subnet.amount(),
            IpMatch::Mask(mask) => mask.amount(),
        }
    }
}

impl fmt::Display for IpMatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IpMatch::Address(ip) => ip.fmt(f),
            IpMatch::Range(range) => range.fmt(f),
            IpMatch::Subnetwork(subnet) => subnet.fmt(f),
            IpMatch::Mask(mask) => mask.fmt(f),
        }
    }
}

impl FromStr for IpMatch {
    type Err = IpMatchError;

    fn from_str(s: &str) -> Result<IpMatch, IpMatchError> {
        crate::parser::get_match(s)
    }
}

impl From<IpAddress> for IpMatch {
    fn from(ip: IpAddress) -> IpMatch {
        IpMatch::Address(ip)
    }
}

impl From<IpRange> for IpMatch {
    fn from(range: IpRange) -> IpMatch {
        IpMatch::Range(range)
    }
}

impl From<IpSubnetwork> for IpMatch {
    fn from(subnet: IpSubnetwork) -> IpMatch {
        IpMatch::Subnetwork(subnet)
    }
}

impl From<IpMask> for IpMatch {
    fn from(mask: IpMask) -> IpMatch {
        IpMatch::Mask(mask)
    }
}

impl Serialize for IpMatch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IpMatch {
    fn deserialize<D>(deserializer: D) -> Result<IpMatch, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(s: &str) -> IpMatch {
        s.parse().expect("test pattern should parse")
    }

    fn ip(s: &str) -> IpAddress {
        s.parse().expect("test address should parse")
    }

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(matcher("10.0.0.0").kind(), "IPv4");
        assert_eq!(matcher("a::b").kind(), "IPv6");
        assert_eq!(matcher("10.0.0.0-10.0.0.5").kind(), "IPRange");
        assert_eq!(matcher("10.0.0.0/24").kind(), "IPSubnetwork");
        assert_eq!(matcher("10.0.0.0/255.0.0.0").kind(), "IPMask");
    }

    #[test]
    fn test_matches_dispatch() {
        assert!(matcher("10.0.0.0/24").matches(&ip("10.0.0.1")));
        assert!(!matcher("10.0.0.0/24").matches(&ip("10.0.1.1")));
        assert!(matcher("abc:*::def").matches(&ip("abc::def")));
        assert!(!matcher("abc:9::def").matches(&ip("abc::def")));
    }

    #[test]
    fn test_kinds_are_never_equal() {
        // All of these match exactly the single address 10.20.30.40.
        let patterns = [
            matcher("10.20.30.40"),
            matcher("10.20.30.40/32"),
            matcher("10.20.30.40-10.20.30.40"),
            matcher("10.20.30.40/255.255.255.255"),
        ];
        for (i, a) in patterns.iter().enumerate() {
            for (j, b) in patterns.iter().enumerate() {
                assert_eq!(a == b, i == j, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_equality_matrix() {
        let patterns = [
            "10.20.30.40",
            "10.20.30.50",
            "10.20.30.40/16",
            "10.20.30.40/24",
            "10.20.30.40/32",
            "10.20.30.40-10.20.30.40",
            "10.20.30.0-10.20.30.255",
            "a::bc:1234",
            "a::bc:5678",
            "a::bc:1234/64",
            "a::bc:1234/112",
            "a::bc:1234/128",
            "a::bc:1234-a::bc:1234",
            "a::bc:0-a::bc:ffff",
        ]
        .map(matcher);
        for (i, a) in patterns.iter().enumerate() {
            for (j, b) in patterns.iter().enumerate() {
                assert_eq!(a == b, i == j, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_convert_to_masks_dispatch() {
        assert_eq!(
            matcher("10.0.0.1/24").convert_to_masks()[0].to_string(),
            "10.0.0.0/255.255.255.0"
        );
        assert_eq!(
            matcher("10.0.0.1/255.0.0.0").convert_to_masks()[0].to_string(),
            "10.0.0.0/255.0.0.0"
        );
        assert_eq!(
            matcher("a::b/24").convert_to_masks()[0].to_string(),
            "a::/ffff:ff00::"
        );
        assert_eq!(
            matcher("a::b/ffff::f00").convert_to_masks()[0].to_string(),
            "a::/ffff::f00"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        for s in [
            "10.0.0.0",
            "10.0.*.0",
            "10.0.0.0-10.1.255.255",
            "10.20.0.0/16",
            "10.0.128.0/255.0.128.0",
            "a::b",
            "a::bc:0/112",
            "a:0:cc00::/ffff:0:ff00::",
        ] {
            let pattern = matcher(s);
            let json = serde_json::to_string(&pattern).unwrap();
            assert_eq!(json, format!("{s:?}"));
            let back: IpMatch = serde_json::from_str(&json).unwrap();
            assert_eq!(back, pattern, "{s}");
        }
    }
}
