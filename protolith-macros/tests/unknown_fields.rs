//! Unknown fields are skipped by wire type, never errors.

use protolith::wire::{self, WireType};

protolith_macros::proto! {r#"
syntax = "proto3";

message Known {
    int32 n = 1;
    string t = 2;
}
"#}

/// Bytes for `Known { n: 150, t: "ok" }` with extra undeclared fields
/// spliced between the known ones, one per wire type.
fn bytes_with_strangers() -> Vec<u8> {
    let mut buf = Vec::new();

    // Unknown varint field 99.
    wire::encode_key(WireType::Varint, 99, &mut buf);
    protolith::scalar::encode_uint64(1 << 40, &mut buf);

    // Known field 1.
    buf.extend_from_slice(&[0x08, 0x96, 0x01]);

    // Unknown 64-bit field 98.
    wire::encode_key(WireType::I64, 98, &mut buf);
    protolith::scalar::encode_fixed64(u64::MAX, &mut buf);

    // Unknown length-delimited field 97.
    wire::encode_key(WireType::Len, 97, &mut buf);
    protolith::scalar::encode_bytes(b"opaque payload", &mut buf);

    // Known field 2.
    buf.extend_from_slice(&[0x12, 0x02, b'o', b'k']);

    // Unknown 32-bit field 96.
    wire::encode_key(WireType::I32, 96, &mut buf);
    protolith::scalar::encode_fixed32(0xdead_beef, &mut buf);

    buf
}

#[test]
fn strangers_are_skipped() {
    let noisy = bytes_with_strangers();
    let clean = [0x08, 0x96, 0x01, 0x12, 0x02, b'o', b'k'];

    let from_noisy = Known::read(&mut &noisy[..], 0).unwrap();
    let from_clean = Known::read(&mut &clean[..], 0).unwrap();

    assert_eq!(from_noisy, from_clean);
    assert_eq!(from_noisy.n().unwrap(), 150);
    assert_eq!(from_noisy.t().unwrap(), "ok");
}

#[test]
fn group_wire_types_fail_the_decode() {
    let mut buf = Vec::new();
    wire::encode_key(WireType::SGroup, 50, &mut buf);

    let err = Known::read(&mut &buf[..], 0).unwrap_err();
    assert_eq!(err, protolith::DecodeError::DeprecatedGroupEncoding);
}

#[test]
fn truncated_known_field_fails_the_decode() {
    // Field 2 announces three bytes but delivers one.
    let buf = [0x12, 0x03, b'o'];
    let err = Known::read(&mut &buf[..], 0).unwrap_err();
    assert_eq!(err, protolith::DecodeError::UnexpectedEndOfBuffer);
}
