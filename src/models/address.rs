//! IP address values with per-part wildcards.
//!
//! Provides [`IpAddress`], the fixed-width value shared by both address
//! families: 4 octets of 8 bits (IPv4) or 8 hextets of 16 bits (IPv6),
//! each part either a concrete number or a `*` wildcard. Exact addresses
//! additionally expose a numeric view used by the subnet and mask
//! arithmetic.

use crate::error::IpMatchError;
use crate::models::IpMask;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family, fixing the part layout of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// IPv4: 4 parts of 8 bits.
    V4,
    /// IPv6: 8 parts of 16 bits.
    V6,
}

impl Family {
    /// Number of parts in an address of this family.
    pub fn part_count(&self) -> usize {
        match self {
            Family::V4 => 4,
            Family::V6 => 8,
        }
    }

    /// Bits per part (8 for IPv4 octets, 16 for IPv6 hextets).
    pub fn bits_per_part(&self) -> u32 {
        match self {
            Family::V4 => 8,
            Family::V6 => 16,
        }
    }

    /// Total bit width of an address (32 or 128).
    pub fn total_bits(&self) -> u32 {
        self.part_count() as u32 * self.bits_per_part()
    }

    /// Largest value a single part can hold.
    pub fn part_max(&self) -> u16 {
        match self {
            Family::V4 => 0xff,
            Family::V6 => 0xffff,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// One part of an address: a concrete octet/hextet or a `*` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// A concrete part value, range-checked against the family.
    Exact(u16),
    /// Matches every value of the part.
    Wildcard,
}

impl Part {
    /// Whether this part is the wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Part::Wildcard)
    }

    /// The concrete value, or `None` for a wildcard.
    pub fn value(&self) -> Option<u16> {
        match self {
            Part::Exact(v) => Some(*v),
            Part::Wildcard => None,
        }
    }
}

/// A single bit of an address value.
///
/// Wildcard parts expose [`Bit::Any`], which bit-level algorithms must
/// treat specially; it is never 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
    Any,
}

/// All-ones value mask for a family (`0xffff_ffff` for IPv4).
pub(crate) fn family_mask(family: Family) -> u128 {
    low_bits(family.total_bits())
}

/// A `u128` with the low `n` bits set.
fn low_bits(n: u32) -> u128 {
    if n >= 128 {
        u128::MAX
    } else {
        (1u128 << n) - 1
    }
}

/// Network mask for a prefix length as a `u128`.
///
/// # Examples
/// ```
/// use ip_matcher::models::{prefix_mask, Family};
/// assert_eq!(prefix_mask(Family::V4, 24).unwrap(), 0xFFFFFF00);
/// assert_eq!(prefix_mask(Family::V4, 0).unwrap(), 0);
/// assert!(prefix_mask(Family::V4, 33).is_err());
/// ```
pub fn prefix_mask(family: Family, prefix: u8) -> Result<u128, IpMatchError> {
    let total = family.total_bits();
    if u32::from(prefix) > total {
        return Err(IpMatchError::PrefixLength { prefix, family });
    }
    let host = total - u32::from(prefix);
    Ok(family_mask(family) & !low_bits(host))
}

/// An IPv4 or IPv6 address, possibly containing wildcard parts.
///
/// Immutable once constructed; all mutating-looking operations return new
/// values. Equality is structural per part (wildcard only equals
/// wildcard); ordering is only defined between exact addresses of the
/// same family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpAddress {
    family: Family,
    parts: Vec<Part>,
}

impl IpAddress {
    /// Build an address from parts, validating count and part ranges.
    pub fn new(family: Family, parts: Vec<Part>) -> Result<IpAddress, IpMatchError> {
        if parts.len() != family.part_count() {
            return Err(IpMatchError::Shape(
                parts.len() * family.bits_per_part() as usize,
            ));
        }
        for part in &parts {
            if let Part::Exact(v) = part {
                if *v > family.part_max() {
                    return Err(IpMatchError::Format {
                        kind: "address part",
                        input: v.to_string(),
                    });
                }
            }
        }
        Ok(IpAddress { family, parts })
    }

    /// The address family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// The parts of this address, most significant first.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Whether the address contains no wildcard parts.
    pub fn is_exact(&self) -> bool {
        self.parts.iter().all(|p| !p.is_wildcard())
    }

    /// Check whether `ip` is matched by this address pattern.
    ///
    /// Wildcard parts of `self` match anything; exact parts require the
    /// same exact value. A wildcard part in `ip` only matches where
    /// `self` is also wildcard, so `10.0.0.*` matches `10.0.0.3` but not
    /// the other way around. Addresses of the other family never match.
    pub fn matches(&self, ip: &IpAddress) -> bool {
        if self.family != ip.family {
            return false;
        }
        self.parts
            .iter()
            .zip(ip.parts.iter())
            .all(|(wanted, given)| match wanted {
                Part::Wildcard => true,
                Part::Exact(_) => wanted == given,
            })
    }

    /// Numeric value of an exact address, big-endian across parts.
    ///
    /// IPv4 occupies the low 32 bits. Returns `None` if any part is a
    /// wildcard.
    pub fn value(&self) -> Option<u128> {
        let bpp = self.family.bits_per_part();
        let mut acc: u128 = 0;
        for part in &self.parts {
            acc = (acc << bpp) | u128::from(part.value()?);
        }
        Some(acc)
    }

    /// Rebuild an exact address from its numeric value.
    pub(crate) fn from_value(family: Family, value: u128) -> IpAddress {
        debug_assert!(
            value <= family_mask(family),
            "value out of range for {family}"
        );
        let bpp = family.bits_per_part();
        let count = family.part_count();
        let parts = (0..count)
            .map(|i| {
                let shift = bpp * (count - 1 - i) as u32;
                Part::Exact(((value >> shift) as u16) & family.part_max())
            })
            .collect();
        IpAddress { family, parts }
    }

    /// The smallest exact address this pattern matches (wildcards → 0).
    pub fn lower_bound(&self) -> IpAddress {
        let parts = self
            .parts
            .iter()
            .map(|p| Part::Exact(p.value().unwrap_or(0)))
            .collect();
        IpAddress {
            family: self.family,
            parts,
        }
    }

    /// The largest exact address this pattern matches (wildcards → max).
    pub fn upper_bound(&self) -> IpAddress {
        let max = self.family.part_max();
        let parts = self
            .parts
            .iter()
            .map(|p| Part::Exact(p.value().unwrap_or(max)))
            .collect();
        IpAddress {
            family: self.family,
            parts,
        }
    }

    /// The next address in order, or `None` at the maximum.
    ///
    /// Wildcard parts are held fixed; the carry only propagates through
    /// exact parts. E.g. the next of `10.0.*.255` is `10.1.*.0`.
    pub fn next(&self) -> Option<IpAddress> {
        let max = self.family.part_max();
        let mut parts = self.parts.clone();
        for i in (0..parts.len()).rev() {
            match parts[i] {
                Part::Wildcard => continue,
                Part::Exact(v) if v < max => {
                    parts[i] = Part::Exact(v + 1);
                    return Some(IpAddress {
                        family: self.family,
                        parts,
                    });
                }
                Part::Exact(_) => parts[i] = Part::Exact(0),
            }
        }
        None
    }

    /// The previous address in order, or `None` at the minimum.
    ///
    /// Wildcard parts are held fixed, as in [`IpAddress::next`]. E.g. the
    /// previous of `10.0.*.0` is `9.255.*.255`.
    pub fn previous(&self) -> Option<IpAddress> {
        let max = self.family.part_max();
        let mut parts = self.parts.clone();
        for i in (0..parts.len()).rev() {
            match parts[i] {
                Part::Wildcard => continue,
                Part::Exact(v) if v > 0 => {
                    parts[i] = Part::Exact(v - 1);
                    return Some(IpAddress {
                        family: self.family,
                        parts,
                    });
                }
                Part::Exact(_) => parts[i] = Part::Exact(max),
            }
        }
        None
    }

    /// Flat bit view, most significant bit first within and across parts.
    ///
    /// Wildcard parts contribute [`Bit::Any`] for each of their bits.
    pub fn to_bits(&self) -> Vec<Bit> {
        let bpp = self.family.bits_per_part();
        let mut bits = Vec::with_capacity(self.family.total_bits() as usize);
        for part in &self.parts {
            match part.value() {
                None => bits.extend(std::iter::repeat(Bit::Any).take(bpp as usize)),
                Some(v) => {
                    for shift in (0..bpp).rev() {
                        bits.push(if (v >> shift) & 1 == 1 { Bit::One } else { Bit::Zero });
                    }
                }
            }
        }
        bits
    }

    /// Rebuild an address from its bit view.
    ///
    /// The length selects the family: 32 bits for IPv4, 128 for IPv6;
    /// anything else is a [`IpMatchError::Shape`]. A part must be wholly
    /// exact or wholly [`Bit::Any`]; mixing the two within one part is
    /// rejected the same way.
    pub fn from_bits(bits: &[Bit]) -> Result<IpAddress, IpMatchError> {
        let family = match bits.len() {
            32 => Family::V4,
            128 => Family::V6,
            n => return Err(IpMatchError::Shape(n)),
        };
        let bpp = family.bits_per_part() as usize;
        let mut parts = Vec::with_capacity(family.part_count());
        for chunk in bits.chunks(bpp) {
            if chunk.iter().all(|b| *b == Bit::Any) {
                parts.push(Part::Wildcard);
                continue;
            }
            let mut v: u16 = 0;
            for bit in chunk {
                v = (v << 1)
                    | match bit {
                        Bit::Zero => 0,
                        Bit::One => 1,
                        Bit::Any => return Err(IpMatchError::Shape(bits.len())),
                    };
            }
            parts.push(Part::Exact(v));
        }
        Ok(IpAddress { family, parts })
    }

    /// Number of distinct exact addresses this pattern matches.
    ///
    /// Saturates at `u128::MAX` for the all-wildcard IPv6 pattern, whose
    /// true count (2^128) does not fit.
    pub fn amount(&self) -> u128 {
        let wildcard_bits = self.parts.iter().filter(|p| p.is_wildcard()).count() as u32
            * self.family.bits_per_part();
        if wildcard_bits >= 128 {
            u128::MAX
        } else {
            1u128 << wildcard_bits
        }
    }

    /// Convert this pattern to the equivalent single-element mask list.
    ///
    /// Wildcard parts become don't-care parts of the mask:
    /// `10.*.0.1` becomes `10.0.0.1/255.0.255.255`.
    pub fn convert_to_masks(&self) -> Vec<IpMask> {
        let max = self.family.part_max();
        let addr_parts = self
            .parts
            .iter()
            .map(|p| Part::Exact(p.value().unwrap_or(0)))
            .collect();
        let mask_parts = self
            .parts
            .iter()
            .map(|p| match p {
                Part::Wildcard => Part::Exact(0),
                Part::Exact(_) => Part::Exact(max),
            })
            .collect();
        let address = IpAddress {
            family: self.family,
            parts: addr_parts,
        };
        let mask = IpAddress {
            family: self.family,
            parts: mask_parts,
        };
        vec![IpMask::from_canonical(address, mask)]
    }

    /// The 8 hextets of an IPv6 address as strings (`"*"` for wildcards),
    /// or `None` for an IPv4 address.
    pub fn to_hextets(&self) -> Option<Vec<String>> {
        match self.family {
            Family::V4 => None,
            Family::V6 => Some(self.parts.iter().map(hextet_str).collect()),
        }
    }

    /// Full-length form without `::` elision, leading zeros suppressed,
    /// e.g. `a:0:0:0:0:b:0:c`. IPv4 addresses render dotted-quad.
    pub fn to_long_string(&self) -> String {
        match self.family {
            Family::V4 => self.to_string(),
            Family::V6 => {
                let groups: Vec<String> = self.parts.iter().map(hextet_str).collect();
                groups.join(":")
            }
        }
    }

    /// Fully zero-padded form, e.g. `000a:0000:...:000c`. IPv4 addresses
    /// render dotted-quad.
    pub fn to_full_string(&self) -> String {
        match self.family {
            Family::V4 => self.to_string(),
            Family::V6 => {
                let groups: Vec<String> = self
                    .parts
                    .iter()
                    .map(|p| match p.value() {
                        None => "*".to_string(),
                        Some(v) => format!("{v:04x}"),
                    })
                    .collect();
                groups.join(":")
            }
        }
    }

    /// Mixed form with the low 32 bits rendered dotted-quad, e.g.
    /// `::ffff:169.219.13.133`. A wildcard hextet in the low 32 bits
    /// renders as `*.*`. IPv4 addresses render dotted-quad.
    pub fn to_mixed_string(&self) -> String {
        match self.family {
            Family::V4 => self.to_string(),
            Family::V6 => {
                let prefix = shorten_groups(&self.parts[..6]);
                let quad = format!(
                    "{}.{}",
                    octet_pair(&self.parts[6]),
                    octet_pair(&self.parts[7])
                );
                if prefix.ends_with("::") {
                    format!("{prefix}{quad}")
                } else {
                    format!("{prefix}:{quad}")
                }
            }
        }
    }

    /// Whether this IPv6 address lies in one of the two IPv4-mapped /96
    /// ranges (`::ffff:0:0/96` or the legacy translator `::ffff:0:0:0/96`).
    fn is_ipv4_mapped(&self) -> bool {
        if self.family != Family::V6 {
            return false;
        }
        let zero = Part::Exact(0);
        let ffff = Part::Exact(0xffff);
        (self.parts[..5].iter().all(|p| *p == zero) && self.parts[5] == ffff)
            || (self.parts[..4].iter().all(|p| *p == zero)
                && self.parts[4] == ffff
                && self.parts[5] == zero)
    }
}

/// One hextet as text: lowercase hex without leading zeros, `*` for a
/// wildcard.
fn hextet_str(part: &Part) -> String {
    match part.value() {
        None => "*".to_string(),
        Some(v) => format!("{v:x}"),
    }
}

/// Two dotted octets for one hextet of a mixed-form tail.
fn octet_pair(part: &Part) -> String {
    match part.value() {
        None => "*.*".to_string(),
        Some(v) => format!("{}.{}", v >> 8, v & 0xff),
    }
}

/// Join hextets with the longest leftmost run of all-zero groups
/// collapsed to `::`. A run of a single zero group also collapses,
/// matching the text the parser accepts.
fn shorten_groups(parts: &[Part]) -> String {
    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < parts.len() {
        if parts[i] == Part::Exact(0) {
            let start = i;
            while i < parts.len() && parts[i] == Part::Exact(0) {
                i += 1;
            }
            let len = i - start;
            if best.map_or(true, |(_, l)| len > l) {
                best = Some((start, len));
            }
        } else {
            i += 1;
        }
    }
    let groups: Vec<String> = parts.iter().map(hextet_str).collect();
    match best {
        None => groups.join(":"),
        Some((start, len)) => {
            let left = groups[..start].join(":");
            let right = groups[start + len..].join(":");
            format!("{left}::{right}")
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.family {
            Family::V4 => {
                let groups: Vec<String> = self
                    .parts
                    .iter()
                    .map(|p| match p.value() {
                        None => "*".to_string(),
                        Some(v) => v.to_string(),
                    })
                    .collect();
                write!(f, "{}", groups.join("."))
            }
            Family::V6 => {
                if self.is_ipv4_mapped() {
                    write!(f, "{}", self.to_mixed_string())
                } else {
                    write!(f, "{}", shorten_groups(&self.parts))
                }
            }
        }
    }
}

impl PartialOrd for IpAddress {
    /// Numeric order, defined only between exact addresses of the same
    /// family (structurally equal values always compare equal).
    fn partial_cmp(&self, other: &IpAddress) -> Option<Ordering> {
        if self.family != other.family {
            return None;
        }
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }
}

impl FromStr for IpAddress {
    type Err = IpMatchError;

    fn from_str(s: &str) -> Result<IpAddress, IpMatchError> {
        crate::parser::get_ip(s)
    }
}

impl From<Ipv4Addr> for IpAddress {
    fn from(addr: Ipv4Addr) -> IpAddress {
        let parts = addr
            .octets()
            .iter()
            .map(|o| Part::Exact(u16::from(*o)))
            .collect();
        IpAddress {
            family: Family::V4,
            parts,
        }
    }
}

impl From<Ipv6Addr> for IpAddress {
    fn from(addr: Ipv6Addr) -> IpAddress {
        let parts = addr.segments().iter().map(|s| Part::Exact(*s)).collect();
        IpAddress {
            family: Family::V6,
            parts,
        }
    }
}

impl TryFrom<&IpAddress> for IpAddr {
    type Error = IpMatchError;

    fn try_from(ip: &IpAddress) -> Result<IpAddr, IpMatchError> {
        let value = ip
            .value()
            .ok_or(IpMatchError::WildcardAddress("std address conversion"))?;
        Ok(match ip.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::from(value as u32)),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(value)),
        })
    }
}

impl Serialize for IpAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IpAddress {
    fn deserialize<D>(deserializer: D) -> Result<IpAddress, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
