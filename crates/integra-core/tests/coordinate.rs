use integra_core::coordinate::Coordinate;

#[test]
fn coordinate_parse_valid() {
    let coord = Coordinate::parse("acme:http-client").unwrap();
    assert_eq!(coord.namespace, "acme");
    assert_eq!(coord.name, "http-client");
}

#[test]
fn coordinate_parse_without_colon_fails() {
    assert!(Coordinate::parse("acme").is_err());
}

#[test]
fn coordinate_parse_empty_string_fails() {
    assert!(Coordinate::parse("").is_err());
}

#[test]
fn coordinate_parse_empty_half_fails() {
    assert!(Coordinate::parse(":http").is_err());
    assert!(Coordinate::parse("acme:").is_err());
}

#[test]
fn coordinate_parse_three_parts_fails() {
    assert!(Coordinate::parse("acme:http:1.0.0").is_err());
}

#[test]
fn coordinate_parse_whitespace_fails() {
    assert!(!Coordinate::is_valid("acme: http"));
}

#[test]
fn coordinate_display_roundtrip() {
    let s = "vendor.sensors:modbus";
    assert_eq!(Coordinate::parse(s).unwrap().to_string(), s);
}
