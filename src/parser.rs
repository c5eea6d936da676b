//! Textual format recognition for addresses and match patterns.
//!
//! Recognized forms: dotted-quad (`10.0.0.1`, wildcard octets allowed),
//! colon-hex (`a::bc:1`, wildcard hextets allowed, optional dotted-quad
//! tail for the mixed form), ranges (`ip-ip`), CIDR subnetworks
//! (`ip/24`) and masks (`ip/maskip`). All validation happens here or in
//! the value constructors; no partially-valid value ever escapes.

use crate::error::IpMatchError;
use crate::models::{Family, IpAddress, IpMask, IpMatch, IpRange, IpSubnetwork, Part};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Dotted-quad with optional wildcard octets.
    static ref IPV4_RE: Regex =
        Regex::new(r"^(\d{1,3}|\*)(\.(\d{1,3}|\*)){3}$").expect("Invalid Regex?");
    /// Character gate for colon-hex text (already lowercased); the
    /// structure is validated by the group parser below.
    static ref IPV6_RE: Regex = Regex::new(r"^[0-9a-f:.*]+$").expect("Invalid Regex?");
}

/// Parse a single (possibly wildcard) IPv4 or IPv6 address.
pub fn get_ip(input: &str) -> Result<IpAddress, IpMatchError> {
    let text = input.trim().to_ascii_lowercase();
    if IPV4_RE.is_match(&text) {
        return parse_v4(&text);
    }
    if text.contains(':') && IPV6_RE.is_match(&text) {
        return parse_v6(&text);
    }
    Err(IpMatchError::Format {
        kind: "address",
        input: input.trim().to_string(),
    })
}

/// Parse any match pattern: address, range, subnetwork or mask.
///
/// The textual shape selects the kind: `a-b` is a range, `a/24` a
/// subnetwork, `a/m` a mask, anything else must be a plain address.
pub fn get_match(input: &str) -> Result<IpMatch, IpMatchError> {
    let text = input.trim();
    if let Some((left, right)) = text.split_once('-') {
        let left = get_ip(left)?;
        let right = get_ip(right)?;
        return IpRange::new(left, right).map(IpMatch::Range);
    }
    if let Some((left, right)) = text.split_once('/') {
        let ip = get_ip(left)?;
        let right = right.trim();
        if !right.is_empty() && right.bytes().all(|b| b.is_ascii_digit()) {
            let prefix: u8 = right.parse().map_err(|_| IpMatchError::Format {
                kind: "subnetwork",
                input: text.to_string(),
            })?;
            return IpSubnetwork::new(ip, prefix).map(IpMatch::Subnetwork);
        }
        let mask = get_ip(right)?;
        return IpMask::new(ip, mask).map(IpMatch::Mask);
    }
    get_ip(text).map(IpMatch::Address)
}

/// One octet or hextet: a number in `0..=max` in the given radix, or the
/// `*` wildcard.
fn parse_part(
    text: &str,
    radix: u32,
    max: u16,
    input: &str,
) -> Result<Part, IpMatchError> {
    if text == "*" {
        return Ok(Part::Wildcard);
    }
    match u16::from_str_radix(text, radix) {
        Ok(v) if v <= max => Ok(Part::Exact(v)),
        _ => Err(IpMatchError::Format {
            kind: "address",
            input: input.to_string(),
        }),
    }
}

fn parse_v4(text: &str) -> Result<IpAddress, IpMatchError> {
    let parts = text
        .split('.')
        .map(|octet| parse_part(octet, 10, 0xff, text))
        .collect::<Result<Vec<Part>, IpMatchError>>()?;
    IpAddress::new(Family::V4, parts)
}

fn parse_v6(text: &str) -> Result<IpAddress, IpMatchError> {
    let mut tail: Option<[Part; 2]> = None;
    let head = if text.contains('.') {
        // Mixed form: the final group is a dotted-quad standing in for
        // the two low hextets.
        let colon = text.rfind(':').ok_or(IpMatchError::Format {
            kind: "address",
            input: text.to_string(),
        })?;
        let quad = &text[colon + 1..];
        if !IPV4_RE.is_match(quad) {
            return Err(IpMatchError::Format {
                kind: "address",
                input: text.to_string(),
            });
        }
        tail = Some(quad_hextets(quad)?);
        // Substitute two groups for the quad so the `::` fill count is
        // unchanged, then splice the real hextets back in below.
        format!("{}0:0", &text[..colon + 1])
    } else {
        text.to_string()
    };

    let mut parts = parse_groups(&head, text)?;
    if let Some([h6, h7]) = tail {
        parts[6] = h6;
        parts[7] = h7;
    }
    IpAddress::new(Family::V6, parts)
}

/// Split colon-hex text into exactly 8 hextet parts, expanding at most
/// one `::` to the zero groups it elides.
fn parse_groups(text: &str, input: &str) -> Result<Vec<Part>, IpMatchError> {
    let err = || IpMatchError::Format {
        kind: "address",
        input: input.to_string(),
    };
    let hextets = |side: &str| -> Result<Vec<Part>, IpMatchError> {
        if side.is_empty() {
            return Ok(Vec::new());
        }
        side.split(':')
            .map(|h| parse_part(h, 16, 0xffff, input))
            .collect()
    };

    let pieces: Vec<&str> = text.split("::").collect();
    match pieces.len() {
        1 => {
            let parts = hextets(pieces[0])?;
            if parts.len() != 8 {
                return Err(err());
            }
            Ok(parts)
        }
        2 => {
            let left = hextets(pieces[0])?;
            let right = hextets(pieces[1])?;
            // The :: has to elide at least one zero group.
            if left.len() + right.len() >= 8 {
                return Err(err());
            }
            let fill = 8 - left.len() - right.len();
            let mut parts = left;
            parts.extend(std::iter::repeat(Part::Exact(0)).take(fill));
            parts.extend(right);
            Ok(parts)
        }
        _ => Err(err()),
    }
}

/// Convert a dotted-quad tail into the two low hextets. An octet pair is
/// wildcard only if both of its octets are wildcards.
fn quad_hextets(quad: &str) -> Result<[Part; 2], IpMatchError> {
    let octets = parse_v4(quad)?;
    let pair = |a: &Part, b: &Part| -> Result<Part, IpMatchError> {
        match (a.value(), b.value()) {
            (Some(hi), Some(lo)) => Ok(Part::Exact((hi << 8) | lo)),
            (None, None) => Ok(Part::Wildcard),
            _ => Err(IpMatchError::Format {
                kind: "address",
                input: quad.to_string(),
            }),
        }
    };
    let parts = octets.parts();
    Ok([pair(&parts[0], &parts[1])?, pair(&parts[2], &parts[3])?])
}
