//! Every scalar wire shape through one schema.

use protolith::Message;

protolith_macros::proto! {r#"
syntax = "proto3";

message Mixed {
    sint32 s = 1;
    fixed32 f = 2;
    double d = 3;
    bool flag = 4;
    bytes payload = 5;
    sfixed64 big = 6;
    uint32 u = 7;
}

message Node {
    int32 value = 1;
    Node next = 2;
}
"#}

#[test]
fn zigzag_field_wire_bytes() {
    let m = init_Mixed!(s = -1);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x08, 0x01]);

    let rnd = Mixed::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd.s().unwrap(), -1);
}

#[test]
fn fixed32_field_wire_bytes() {
    let m = init_Mixed!(f = 0x01020304);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    // Key (2 << 3) | 5, then little-endian payload.
    assert_eq!(buf, [0x15, 0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn double_field_wire_bytes() {
    let m = init_Mixed!(d = 1.0);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x19, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f]);
}

#[test]
fn bool_field_wire_bytes() {
    let m = init_Mixed!(flag = true);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x20, 0x01]);
}

#[test]
fn bytes_field_roundtrip() {
    let m = init_Mixed!(payload = vec![0u8, 1, 2, 0xff]);
    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf, [0x2a, 0x04, 0x00, 0x01, 0x02, 0xff]);

    let rnd = Mixed::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd.payload().unwrap(), [0x00, 0x01, 0x02, 0xff]);
}

#[test]
fn all_fields_roundtrip_with_length_agreement() {
    let m = init_Mixed!(
        s = -123456,
        f = 42,
        d = -0.5,
        flag = false,
        payload = b"raw".to_vec(),
        big = -9,
        u = 300,
    );

    let mut buf = Vec::new();
    protolith::write(&m, &mut buf, false);
    assert_eq!(buf.len(), m.encoded_len());

    let rnd = Mixed::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd, m);
    assert_eq!(rnd.big().unwrap(), -9);
    assert_eq!(rnd.u().unwrap(), 300);
    assert!(!rnd.flag().unwrap());
}

#[test]
fn recursive_message_chains_roundtrip() {
    // Node boxes its `next` slot, so a chain builds and round-trips.
    let chain = init_Node!(value = 1, next = init_Node!(value = 2, next = init_Node!(value = 3)));

    let mut buf = Vec::new();
    protolith::write(&chain, &mut buf, false);
    assert_eq!(buf.len(), chain.encoded_len());

    let rnd = Node::read(&mut &buf[..], 0).unwrap();
    assert_eq!(rnd.value().unwrap(), 1);
    assert_eq!(rnd.next().unwrap().value().unwrap(), 2);
    assert_eq!(rnd.next().unwrap().next().unwrap().value().unwrap(), 3);
    assert!(rnd.next().unwrap().next().unwrap().next().is_err());
}
