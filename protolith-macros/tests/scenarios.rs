//! Byte-level wire format tests against schemas compiled with `proto!`.

use protolith::Message;

protolith_macros::proto! {r#"
syntax = "proto3";

message M {
    int32 n = 1;
    string t = 2;
}

message Packed {
    repeated int32 xs = 1;
}

message Outer {
    Inner i = 1;
    message Inner { int32 a = 1; }
}

message Choice {
    oneof c {
        int32 a = 1;
        string b = 2;
    }
}
"#}

#[test]
fn varint_field_wire_bytes() {
    let m = init_M!(n = 150);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x08, 0x96, 0x01]);

    let rnd = M::read(&mut &buf[..], 0).unwrap();
    assert!(rnd.has_n());
    assert_eq!(rnd.n().unwrap(), 150);
    assert!(!rnd.has_t());
}

#[test]
fn explicitly_set_zero_is_not_elided() {
    let m = init_M!(n = 0);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x08, 0x00]);

    let rnd = M::read(&mut &buf[..], 0).unwrap();
    assert!(rnd.has_n());
    assert_eq!(rnd.n().unwrap(), 0);
}

#[test]
fn repeated_scalar_encodes_packed() {
    let m = init_Packed!(xs = [1, 2, 3]);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x0a, 0x03, 0x01, 0x02, 0x03]);
}

#[test]
fn repeated_scalar_decodes_unpacked_layout() {
    // One key per element, as an old proto2 writer would emit.
    let bytes = [0x08, 0x01, 0x08, 0x02, 0x08, 0x03];
    let m = Packed::read(&mut &bytes[..], 0).unwrap();
    assert_eq!(m.xs().unwrap(), [1, 2, 3]);
}

#[test]
fn repeated_scalar_decodes_packed_layout() {
    let bytes = [0x0a, 0x03, 0x01, 0x02, 0x03];
    let m = Packed::read(&mut &bytes[..], 0).unwrap();
    assert_eq!(m.xs().unwrap(), [1, 2, 3]);
}

#[test]
fn embedded_message_wire_bytes() {
    let m = init_Outer!(i = init_Outer_Inner!(a = 7));
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x0a, 0x02, 0x08, 0x07]);

    let rnd = Outer::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd.i().unwrap().a().unwrap(), 7);
}

#[test]
fn oneof_last_write_wins() {
    let mut m = Choice::default();
    m.set_a(5);
    m.set_b("x");

    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    // Only `b` reaches the wire: key (2 << 3) | 2, length 1, then "x".
    assert_eq!(buf, [0x12, 0x01, b'x']);

    let rnd = Choice::read(&mut &buf[..], 0).unwrap();
    assert!(rnd.has_c());
    assert_eq!(rnd.c().unwrap(), &Choice_c::B("x".to_string()));
    assert_eq!(rnd.b().unwrap(), "x");
    assert!(!rnd.has_a());
}

#[test]
fn oneof_via_init_member() {
    let m = init_Choice!(a = 9);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x08, 0x09]);
}

#[test]
fn write_length_equals_len() {
    let cases = [
        init_M!(),
        init_M!(n = 150),
        init_M!(n = -1),
        init_M!(t = "hello"),
        init_M!(n = 3, t = "world"),
    ];
    for m in cases {
        let mut buf = Vec::new();
        protolith::write(&m, &mut buf, false);
        assert_eq!(buf.len(), m.encoded_len());
    }

    let packed = init_Packed!(xs = [0, 1, 300, -7]);
    let mut buf = Vec::new();
    protolith::write(&packed, &mut buf, false);
    assert_eq!(buf.len(), packed.encoded_len());
}

#[test]
fn prepend_length_writes_a_prefix() {
    let m = init_M!(n = 150);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, true);
    assert_eq!(buf[0] as usize, m.encoded_len());
    assert_eq!(&buf[1..], [0x08, 0x96, 0x01]);

    // A prefixed message reads back with max_size.
    let mut cursor = &buf[..];
    let len = protolith::wire::decode_len(&mut cursor).unwrap();
    let rnd = M::read(&mut cursor, len).unwrap();
    assert_eq!(rnd.n().unwrap(), 150);
}

#[test]
fn roundtrip_preserves_presence_and_values() {
    let m = init_M!(n = -42, t = "snake_case");
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);

    let rnd = M::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd, m);
    assert_eq!(rnd.n().unwrap(), -42);
    assert_eq!(rnd.t().unwrap(), "snake_case");
}

#[test]
fn bounded_read_leaves_the_tail() {
    let m = init_M!(n = 1);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    let body_len = buf.len();
    buf.extend_from_slice(&[0xde, 0xad]);

    let mut cursor = &buf[..];
    let rnd = M::read(&mut cursor, body_len).unwrap();
    assert_eq!(rnd.n().unwrap(), 1);
    assert_eq!(cursor, [0xde, 0xad]);
}
