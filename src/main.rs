use ip_matcher::output::{print_masks, print_match_results, print_subnets};
use ip_matcher::{compact_masks, get_ip, get_match, IpMask, IpMatch, IpRange};
use std::error::Error;

const USAGE: &str = "\
usage: ip-matcher <command> [args]

commands:
  match <pattern> <ip>...   check which IPs match the pattern
  subnets <pattern>         print the CIDR cover of the pattern
  masks <pattern>           print the pattern as a list of masks
  compact <mask>...         compact a list of masks";

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default()).ok();
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first().map(|(cmd, rest)| (cmd.as_str(), rest)) {
        Some(("match", [pattern, probes @ ..])) if !probes.is_empty() => {
            cmd_match(pattern, probes)
        }
        Some(("subnets", [pattern])) => cmd_subnets(pattern),
        Some(("masks", [pattern])) => cmd_masks(pattern),
        Some(("compact", masks)) if !masks.is_empty() => cmd_compact(masks),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn cmd_match(pattern: &str, probes: &[String]) -> Result<(), Box<dyn Error>> {
    let pattern = get_match(pattern)?;
    let results = probes
        .iter()
        .map(|probe| {
            let ip = get_ip(probe)?;
            Ok((ip.to_string(), pattern.matches(&ip)))
        })
        .collect::<Result<Vec<_>, Box<dyn Error>>>()?;
    print_match_results(&pattern, &results);
    Ok(())
}

fn cmd_subnets(pattern: &str) -> Result<(), Box<dyn Error>> {
    let subnets = match get_match(pattern)? {
        IpMatch::Range(range) => range.convert_to_subnets(),
        IpMatch::Subnetwork(subnet) => vec![subnet],
        // A wildcard address covers the widest range it implies.
        IpMatch::Address(ip) => IpRange::new(ip.clone(), ip)?.convert_to_subnets(),
        IpMatch::Mask(mask) => vec![mask
            .convert_to_subnet()
            .ok_or("mask is not contiguous, it has no CIDR form")?],
    };
    print_subnets(&subnets);
    Ok(())
}

fn cmd_masks(pattern: &str) -> Result<(), Box<dyn Error>> {
    let masks = get_match(pattern)?.convert_to_masks();
    print_masks(&masks);
    Ok(())
}

fn cmd_compact(inputs: &[String]) -> Result<(), Box<dyn Error>> {
    // Any pattern kind is accepted; ranges may contribute several masks.
    let mut masks: Vec<IpMask> = Vec::new();
    for input in inputs {
        masks.extend(get_match(input)?.convert_to_masks());
    }
    print_masks(&compact_masks(&masks));
    Ok(())
}
