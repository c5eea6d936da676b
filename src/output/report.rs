//! Terminal rendering for match results and conversion tables.

use crate::models::{IpMask, IpMatch, IpSubnetwork};
use colored::Colorize;
use itertools::Itertools;

/// Format a value as a right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    if value_str.len() >= width {
        value_str
    } else {
        format!("{value_str:>width$}")
    }
}

/// Print the verdict for each probe address against a pattern.
pub fn print_match_results(pattern: &IpMatch, probes: &[(String, bool)]) {
    println!("pattern {} ({})", pattern, pattern.kind());
    for (probe, matched) in probes {
        let verdict = if *matched {
            "match".green()
        } else {
            "no match".red()
        };
        println!("  {probe}: {verdict}");
    }
}

/// Print the CIDR cover of a pattern as an aligned table.
pub fn print_subnets(subnets: &[IpSubnetwork]) {
    let cidr_width = column_width(subnets.iter().map(|s| s.to_string()), "cidr");
    let first_width = column_width(subnets.iter().map(|s| s.first().to_string()), "first");
    let last_width = column_width(subnets.iter().map(|s| s.last().to_string()), "last");

    println!(
        "{} {} {} amount",
        format_field("cidr", cidr_width),
        format_field("first", first_width),
        format_field("last", last_width),
    );
    for subnet in subnets {
        println!(
            "{} {} {} {}",
            format_field(subnet, cidr_width),
            format_field(subnet.first(), first_width),
            format_field(subnet.last(), last_width),
            subnet.amount()
        );
    }
}

/// Print masks one per line.
pub fn print_masks(masks: &[IpMask]) {
    println!("{}", masks.iter().map(|m| m.to_string()).join("\n"));
}

fn column_width(values: impl Iterator<Item = String>, header: &str) -> usize {
    values
        .map(|v| v.len())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}
