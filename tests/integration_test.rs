//! Integration tests for ip-matcher
//!
//! These tests walk the public API end to end: parsing, matching,
//! conversions, range decomposition and mask compaction.

use ip_matcher::{compact_masks, get_match, matches, IpAddress, IpMask, IpMatch, Part};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::{Ipv4Addr, Ipv6Addr};

fn ip(s: &str) -> IpAddress {
    s.parse().expect("test address should parse")
}

fn mask(s: &str) -> IpMask {
    s.parse().expect("test mask should parse")
}

#[test]
fn test_matches_walkthrough() {
    assert!(matches("10.0.0.1", "10.0.0.0/24").unwrap());
    assert!(!matches("10.0.1.1", "10.0.0.0/24").unwrap());
    assert!(matches("abc::def", "abc:*::def").unwrap());
    assert!(!matches("abc::def", "abc:9::def").unwrap());

    let subnet = get_match("fefe::0001:abcd/112").unwrap();
    assert_eq!(subnet.kind(), "IPSubnetwork");
    assert!(subnet.matches(&ip("FEFE::1:bbbb")));
    assert!(!subnet.matches(&ip("FEFE::2:bbbb")));
}

#[test]
fn test_v4_walkthrough() {
    let plain = get_match("10.0.0.0").unwrap();
    assert!(plain.matches(&ip("10.0.0.0")));
    assert!(!plain.matches(&ip("9.255.255.255")));

    let wildcard = get_match("10.0.*.0").unwrap();
    assert_eq!(wildcard.kind(), "IPv4");
    assert!(wildcard.matches(&ip("10.0.0.0")));
    assert!(wildcard.matches(&ip("10.0.123.0")));
    assert!(!wildcard.matches(&ip("10.0.0.123")));

    let range = get_match("10.0.0.0-10.1.255.255").unwrap();
    assert!(range.matches(&ip("10.0.0.5")));
    assert!(range.matches(&ip("10.0.5.5")));
    assert!(!range.matches(&ip("10.5.5.5")));

    let subnet = get_match("10.20.30.40/16").unwrap();
    assert_eq!(subnet.to_string(), "10.20.0.0/16");
    for hit in ["10.20.30.40", "10.20.50.50", "10.20.255.255", "10.20.20.40"] {
        assert!(subnet.matches(&ip(hit)), "{hit}");
    }
    for miss in ["10.21.0.0", "10.21.30.40", "10.5.5.5"] {
        assert!(!subnet.matches(&ip(miss)), "{miss}");
    }

    let mask = get_match("10.20.130.40/255.0.128.0").unwrap();
    assert_eq!(mask.to_string(), "10.0.128.0/255.0.128.0");
    for hit in ["10.20.130.40", "10.30.130.50", "10.20.150.50", "10.20.255.255", "10.50.130.50"] {
        assert!(mask.matches(&ip(hit)), "{hit}");
    }
    for miss in ["10.20.10.50", "11.50.130.50"] {
        assert!(!mask.matches(&ip(miss)), "{miss}");
    }
}

#[test]
fn test_v6_walkthrough() {
    let plain = get_match("aaaa::bbbb").unwrap();
    assert!(plain.matches(&ip("aaaa::bbbb")));
    assert!(!plain.matches(&ip("aaaa::cccc")));

    let wildcard = get_match("aaaa::*:cccc").unwrap();
    assert!(wildcard.matches(&ip("aaaa::cccc")));
    assert!(wildcard.matches(&ip("aaaa::1234:cccc")));
    assert!(!wildcard.matches(&ip("aaaa::cccd")));

    let range = get_match("aaaa::bbbb:0-aaaa::cccc:0").unwrap();
    assert!(range.matches(&ip("aaaa::bbbb:0")));
    assert!(range.matches(&ip("aaaa::bbcc:1234")));
    assert!(!range.matches(&ip("aaaa::1:bbbb:0")));

    let subnet = get_match("a:b:c:d::/64").unwrap();
    assert!(subnet.matches(&ip("a:b:c:d::")));
    assert!(subnet.matches(&ip("a:b:c:d:ffff:ffff:ffff:ffff")));
    assert!(subnet.matches(&ip("a:b:c:d:1:2:3:4")));
    assert!(!subnet.matches(&ip("a:b:c:dd::")));
    assert!(!subnet.matches(&ip("a:b:c:cfff::")));
    assert!(!subnet.matches(&ip("c::")));

    let mask = get_match("a:b:cccc:d::/ffff:0:ff00:0::").unwrap();
    assert_eq!(mask.to_string(), "a:0:cc00::/ffff:0:ff00::");
    for hit in ["a:0:cc00::", "a:0:cc00::1", "a:0:ccdd::"] {
        assert!(mask.matches(&ip(hit)), "{hit}");
    }
    for miss in ["a::", "a:0:dd00::", "b:0:cc00::"] {
        assert!(!mask.matches(&ip(miss)), "{miss}");
    }

    // Rendering forms.
    assert_eq!(ip("a:0:0::B:0:C").to_string(), "a::b:0:c");
    assert_eq!(ip("a:0:0::B:0:C").to_long_string(), "a:0:0:0:0:b:0:c");
    assert_eq!(
        ip("a:0:0::B:0:C").to_full_string(),
        "000a:0000:0000:0000:0000:000b:0000:000c"
    );
    assert_eq!(ip("::ffff:a9db:d85").to_mixed_string(), "::ffff:169.219.13.133");
    assert_eq!(ip("::ffff:a9db:*").to_mixed_string(), "::ffff:169.219.*.*");
    assert_eq!(ip("a::10.0.0.0").to_mixed_string(), "a::10.0.0.0");
    assert_eq!(
        ip("a:0:*::B:0:C").to_hextets().unwrap(),
        vec!["a", "0", "*", "0", "0", "b", "0", "c"]
    );
    assert_eq!(get_match("a::bc:1234/112").unwrap().to_string(), "a::bc:0/112");
    assert_eq!(
        get_match("a::abbc:1234/ffff::ff80:000f").unwrap().to_string(),
        "a::ab80:4/ffff::ff80:f"
    );
    assert_eq!(ip("::ffff:a9db:*").to_string(), "::ffff:169.219.*.*");
    assert_eq!(ip("::ffff:0:a9:0").to_string(), "::ffff:0:0.169.0.0");
    assert_eq!(ip("::ffff:0:0.169.0.0").to_string(), "::ffff:0:0.169.0.0");
}

#[test]
fn test_conversion_vectors_v4() {
    let to_mask_strings = |s: &str| -> Vec<String> {
        get_match(s)
            .unwrap()
            .convert_to_masks()
            .iter()
            .map(|m| m.to_string())
            .collect()
    };
    assert_eq!(to_mask_strings("10.0.0.1/24"), vec!["10.0.0.0/255.255.255.0"]);
    assert_eq!(to_mask_strings("10.0.0.1"), vec!["10.0.0.1/255.255.255.255"]);
    assert_eq!(to_mask_strings("10.*.0.1"), vec!["10.0.0.1/255.0.255.255"]);
    assert_eq!(to_mask_strings("10.0.0.1/255.0.0.0"), vec!["10.0.0.0/255.0.0.0"]);

    let range = match get_match("1.1.1.111-1.1.1.120").unwrap() {
        IpMatch::Range(range) => range,
        other => panic!("expected a range, got {other}"),
    };
    let masks = range.convert_to_masks();
    assert_eq!(masks.len(), 3);
    assert_eq!(masks[0].to_string(), "1.1.1.111/255.255.255.255");
    assert_eq!(masks[1].to_string(), "1.1.1.112/255.255.255.248");
    assert_eq!(masks[2].to_string(), "1.1.1.120/255.255.255.255");
    let subnets = range.convert_to_subnets();
    assert_eq!(subnets.len(), 3);
    assert_eq!(subnets[0].to_string(), "1.1.1.111/32");
    assert_eq!(subnets[1].to_string(), "1.1.1.112/29");
    assert_eq!(subnets[2].to_string(), "1.1.1.120/32");
}

#[test]
fn test_conversion_vectors_v6() {
    let to_mask_strings = |s: &str| -> Vec<String> {
        get_match(s)
            .unwrap()
            .convert_to_masks()
            .iter()
            .map(|m| m.to_string())
            .collect()
    };
    assert_eq!(to_mask_strings("a::b/24"), vec!["a::/ffff:ff00::"]);
    assert_eq!(
        to_mask_strings("a::b"),
        vec!["a::b/ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"]
    );
    assert_eq!(
        to_mask_strings("a:*::b"),
        vec!["a::b/ffff::ffff:ffff:ffff:ffff:ffff:ffff"]
    );
    assert_eq!(to_mask_strings("a::b/ffff::f00"), vec!["a::/ffff::f00"]);

    let range = match get_match("a:b:0:ff::-a:b:8:ffff::").unwrap() {
        IpMatch::Range(range) => range,
        other => panic!("expected a range, got {other}"),
    };
    let masks = range.convert_to_masks();
    assert_eq!(masks.len(), 29);
    assert_eq!(masks[0].to_string(), "a:b:0:ff::/ffff:ffff:ffff:ffff::");
    assert_eq!(masks[11].to_string(), "a:b:4::/ffff:ffff:fffc::");
    assert_eq!(
        masks[28].to_string(),
        "a:b:8:ffff::/ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"
    );
    let subnets = range.convert_to_subnets();
    assert_eq!(subnets.len(), 29);
    assert_eq!(subnets[0].to_string(), "a:b:0:ff::/64");
    assert_eq!(subnets[11].to_string(), "a:b:4::/46");
    assert_eq!(subnets[28].to_string(), "a:b:8:ffff::/128");
}

/// The largest exact address a mask matches: don't-care bits saturated.
fn saturated(mask: &IpMask) -> IpAddress {
    let family = mask.family();
    let parts = mask
        .address()
        .parts()
        .iter()
        .zip(mask.mask().parts())
        .map(|(a, m)| {
            let free = !m.value().expect("mask bits are exact") & family.part_max();
            Part::Exact(a.value().expect("canonical address is exact") | free)
        })
        .collect();
    IpAddress::new(family, parts).expect("parts stay in range")
}

/// Structural edge-case probes around every mask boundary.
fn edge_cases(masks: &[IpMask]) -> Vec<IpAddress> {
    let mut cases = Vec::new();
    for mask in masks {
        for anchor in [mask.address().clone(), mask.mask().clone(), saturated(mask)] {
            if let Some(prev) = anchor.previous() {
                cases.push(prev);
            }
            if let Some(next) = anchor.next() {
                cases.push(next);
            }
            cases.push(anchor);
        }
    }
    cases
}

fn assert_equivalent(input: &[IpMask], compacted: &[IpMask], probes: &[IpAddress]) {
    for probe in probes {
        let before = input.iter().any(|m| m.matches(probe));
        let after = compacted.iter().any(|m| m.matches(probe));
        assert_eq!(before, after, "probe {probe} changed verdict");
    }
}

#[test]
fn test_compact_equivalence_v4() {
    let masks = [
        mask("10.0.0.0/255.0.255.0"),
        mask("10.0.0.0/255.0.255.0"),
        mask("10.0.0.0/255.255.1.0"),
        mask("10.0.0.0/255.255.0.255"),
        mask("11.0.0.0/255.0.255.0"),
        mask("20.1.2.3/255.0.0.0"),
        mask("20.1.2.3/0.255.0.0"),
        mask("20.1.2.3/255.255.0.0"),
    ];
    let compacted = compact_masks(&masks);
    assert!(compacted.len() <= masks.len());

    let mut probes = edge_cases(&masks);
    probes.extend(edge_cases(&compacted));
    let mut rng = StdRng::seed_from_u64(0x1b1b);
    for _ in 0..1000 {
        probes.push(IpAddress::from(Ipv4Addr::from(rng.gen::<u32>())));
    }
    assert_equivalent(&masks, &compacted, &probes);
}

#[test]
fn test_compact_equivalence_v6() {
    let masks = [
        mask("a:b:c:d::/ffff::"),
        mask("a:b:c:d::/ffff::"),
        mask("a:b:c:d::/0:ffff::"),
        mask("a:b:c:d::/ffff:ffff::"),
        mask("b:b:c:d::/ffff::"),
        mask("fa:b:c:d::/ffff::"),
        mask("fb:b:c:d::/ffff::"),
        mask("8888:1:2:3::/ffff::"),
        mask("8888:1:2:3::/0:ffff::"),
        mask("8888:1:2:3::/ffff:ffff::"),
    ];
    let compacted = compact_masks(&masks);
    assert!(compacted.len() <= masks.len());
    assert_eq!(compacted.len(), 5);

    let mut probes = edge_cases(&masks);
    probes.extend(edge_cases(&compacted));
    let mut rng = StdRng::seed_from_u64(0x6b6b);
    for _ in 0..1000 {
        probes.push(IpAddress::from(Ipv6Addr::from(rng.gen::<u128>())));
    }
    assert_equivalent(&masks, &compacted, &probes);
}

#[test]
fn test_compact_sweeps_first_parts() {
    // Sweep the full first-two-octet space against the v4 set.
    let masks = [
        mask("10.0.0.0/255.0.255.0"),
        mask("10.0.0.0/255.255.1.0"),
        mask("10.0.0.0/255.255.0.255"),
        mask("11.0.0.0/255.0.255.0"),
        mask("20.1.2.3/255.0.0.0"),
        mask("20.1.2.3/0.255.0.0"),
        mask("20.1.2.3/255.255.0.0"),
    ];
    let compacted = compact_masks(&masks);
    for i in 0..=0xffffu32 {
        let probe = IpAddress::from(Ipv4Addr::from(i << 16));
        let before = masks.iter().any(|m| m.matches(&probe));
        let after = compacted.iter().any(|m| m.matches(&probe));
        assert_eq!(before, after, "probe {probe} changed verdict");
    }
}

#[test]
fn test_serde_whitelist_round_trip() {
    let whitelist: Vec<IpMatch> = vec![
        get_match("10.0.0.0/24").unwrap(),
        get_match("10.0.*.1").unwrap(),
        get_match("a::bc:0-a::bc:ffff").unwrap(),
        get_match("10.0.128.0/255.0.128.0").unwrap(),
    ];
    let json = serde_json::to_string(&whitelist).unwrap();
    assert_eq!(
        json,
        "[\"10.0.0.0/24\",\"10.0.*.1\",\"a::bc:0-a::bc:ffff\",\"10.0.128.0/255.0.128.0\"]"
    );
    let back: Vec<IpMatch> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, whitelist);
}

#[test]
fn test_family_mismatch_is_an_error() {
    assert!(get_match("10.0.0.0-a::b").is_err());
    assert!(get_match("10.0.0.0/ffff::").is_err());
    assert!(mask("10.0.0.0/255.0.0.0")
        .is_subset_of(&mask("a::/ffff::"))
        .is_err());
}
