//! Library focused on IP matching: addresses with wildcard parts,
//! ranges, CIDR subnetworks and generalized bitmasks, plus the
//! algorithms to convert between those representations and to compact
//! collections of them.
//!
//! ```
//! use ip_matcher::matches;
//!
//! assert!(matches("10.0.0.1", "10.0.0.0/24").unwrap());
//! assert!(!matches("10.0.1.1", "10.0.0.0/24").unwrap());
//! assert!(matches("abc::def", "abc:*::def").unwrap());
//! ```

mod error;
pub mod models;
pub mod output;
pub mod parser;
pub mod processing;

pub use error::IpMatchError;
pub use models::{Bit, Family, IpAddress, IpMask, IpMatch, IpRange, IpSubnetwork, Part};
pub use parser::{get_ip, get_match};
pub use processing::{compact_masks, range_to_subnets};

/// Check whether the given IP matches the given pattern.
///
/// # Arguments
/// * `ip` - The IP to check, converted to an exact address
/// * `pattern` - The pattern to check against (address, range,
///   subnetwork or mask notation)
///
/// # Errors
/// Fails if either argument does not have a correct format.
pub fn matches(ip: &str, pattern: &str) -> Result<bool, IpMatchError> {
    let ip = parser::get_ip(ip)?;
    let pattern = parser::get_match(pattern)?;
    Ok(pattern.matches(&ip))
}
