use crate::proto::{Ipv4Addr, is_valid_ip};

#[test]
fn is_valid_ip_accepts_exactly_four_octets_in_range() {
    assert!(!is_valid_ip("122"));
    assert!(is_valid_ip("122.13.154.255"));
    assert!(!is_valid_ip("122.256.154.255"));
    assert!(!is_valid_ip("122.13.154.255.1"));
    assert!(!is_valid_ip("122.13.154.a"));
}

#[test]
fn is_valid_ip_rejects_empty_and_signed_parts() {
    assert!(!is_valid_ip(""));
    assert!(!is_valid_ip("1..2.3"));
    assert!(!is_valid_ip("-1.2.3.4"));
    assert!(!is_valid_ip("+1.2.3.4"));
    assert!(is_valid_ip(" 10.0.0.1 "));
}

#[test]
fn parse_display_round_trip() {
    let addr: Ipv4Addr = "192.168.30.1".parse().expect("valid address");
    assert_eq!(addr, Ipv4Addr([192, 168, 30, 1]));
    assert_eq!(addr.to_string(), "192.168.30.1");
}

#[test]
fn network_masks_per_octet() {
    let addr = Ipv4Addr([192, 168, 30, 77]);
    let mask = Ipv4Addr([255, 255, 255, 0]);
    assert_eq!(addr.network(mask), Ipv4Addr([192, 168, 30, 0]));

    let wide = Ipv4Addr([255, 0, 0, 0]);
    assert_eq!(addr.network(wide), Ipv4Addr([192, 0, 0, 0]));
}

#[test]
fn successor_increments_across_octet_boundaries() {
    let addr = Ipv4Addr([10, 0, 0, 255]);
    assert_eq!(addr.successor(), Ipv4Addr([10, 0, 1, 0]));
}

#[test]
fn broadcast_and_unspecified_constants() {
    assert!(Ipv4Addr::BROADCAST.is_broadcast());
    assert!(Ipv4Addr::UNSPECIFIED.is_unspecified());
    assert!(!Ipv4Addr([255, 255, 255, 254]).is_broadcast());
}

#[test]
fn serde_uses_dotted_form() {
    let addr = Ipv4Addr([80, 1, 1, 10]);
    let json = serde_json::to_string(&addr).expect("serialize");
    assert_eq!(json, "\"80.1.1.10\"");
    let back: Ipv4Addr = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, addr);
}
