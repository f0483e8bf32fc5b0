//! Scalar codec triples, one per proto scalar type.
//!
//! Each proto scalar maps to an `encode_*` / `decode_*` / `encoded_len_*`
//! triple named after the proto keyword, not the Rust type: `int32`,
//! `sint32`, and `sfixed32` all traffic in `i32` but put different bytes on
//! the wire. Lengths never include the field key.

// Width adjustments between wire and in-memory forms use `as` casts.
#![allow(clippy::as_conversions)]

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::wire;

// int32 / int64 / uint32 / uint64: plain varints. Negative `int32` values
// are sign-extended to 64 bits, exactly as protoc encodes them.

#[inline]
pub fn encode_int32<B: bytes::BufMut>(value: i32, buf: &mut B) {
    (value as i64 as u64).encode_leb128(buf);
}

#[inline]
pub fn decode_int32<B: bytes::Buf>(buf: &mut B) -> Result<i32, DecodeError> {
    Ok(u64::decode_leb128_buf(buf)? as i32)
}

#[inline]
pub fn encoded_len_int32(value: i32) -> usize {
    (value as i64 as u64).encoded_leb128_len()
}

#[inline]
pub fn encode_int64<B: bytes::BufMut>(value: i64, buf: &mut B) {
    (value as u64).encode_leb128(buf);
}

#[inline]
pub fn decode_int64<B: bytes::Buf>(buf: &mut B) -> Result<i64, DecodeError> {
    Ok(u64::decode_leb128_buf(buf)? as i64)
}

#[inline]
pub fn encoded_len_int64(value: i64) -> usize {
    (value as u64).encoded_leb128_len()
}

#[inline]
pub fn encode_uint32<B: bytes::BufMut>(value: u32, buf: &mut B) {
    value.encode_leb128(buf);
}

#[inline]
pub fn decode_uint32<B: bytes::Buf>(buf: &mut B) -> Result<u32, DecodeError> {
    // Tolerate sloppy encoders that sign-extend: truncate from 64 bits.
    Ok(u64::decode_leb128_buf(buf)? as u32)
}

#[inline]
pub fn encoded_len_uint32(value: u32) -> usize {
    value.encoded_leb128_len()
}

#[inline]
pub fn encode_uint64<B: bytes::BufMut>(value: u64, buf: &mut B) {
    value.encode_leb128(buf);
}

#[inline]
pub fn decode_uint64<B: bytes::Buf>(buf: &mut B) -> Result<u64, DecodeError> {
    u64::decode_leb128_buf(buf)
}

#[inline]
pub fn encoded_len_uint64(value: u64) -> usize {
    value.encoded_leb128_len()
}

// sint32 / sint64: ZigZag keeps small-magnitude negatives short.

#[inline]
fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline]
fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[inline]
pub fn encode_sint32<B: bytes::BufMut>(value: i32, buf: &mut B) {
    zigzag_encode32(value).encode_leb128(buf);
}

#[inline]
pub fn decode_sint32<B: bytes::Buf>(buf: &mut B) -> Result<i32, DecodeError> {
    Ok(zigzag_decode32(u64::decode_leb128_buf(buf)? as u32))
}

#[inline]
pub fn encoded_len_sint32(value: i32) -> usize {
    zigzag_encode32(value).encoded_leb128_len()
}

#[inline]
pub fn encode_sint64<B: bytes::BufMut>(value: i64, buf: &mut B) {
    zigzag_encode64(value).encode_leb128(buf);
}

#[inline]
pub fn decode_sint64<B: bytes::Buf>(buf: &mut B) -> Result<i64, DecodeError> {
    Ok(zigzag_decode64(u64::decode_leb128_buf(buf)?))
}

#[inline]
pub fn encoded_len_sint64(value: i64) -> usize {
    zigzag_encode64(value).encoded_leb128_len()
}

// fixed32 / fixed64 / sfixed32 / sfixed64 / float / double: little-endian
// fixed width.

#[inline]
pub fn encode_fixed32<B: bytes::BufMut>(value: u32, buf: &mut B) {
    buf.put_u32_le(value);
}

#[inline]
pub fn decode_fixed32<B: bytes::Buf>(buf: &mut B) -> Result<u32, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(buf.get_u32_le())
}

#[inline]
pub fn encoded_len_fixed32(_value: u32) -> usize {
    4
}

#[inline]
pub fn encode_fixed64<B: bytes::BufMut>(value: u64, buf: &mut B) {
    buf.put_u64_le(value);
}

#[inline]
pub fn decode_fixed64<B: bytes::Buf>(buf: &mut B) -> Result<u64, DecodeError> {
    if buf.remaining() < 8 {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(buf.get_u64_le())
}

#[inline]
pub fn encoded_len_fixed64(_value: u64) -> usize {
    8
}

#[inline]
pub fn encode_sfixed32<B: bytes::BufMut>(value: i32, buf: &mut B) {
    buf.put_i32_le(value);
}

#[inline]
pub fn decode_sfixed32<B: bytes::Buf>(buf: &mut B) -> Result<i32, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(buf.get_i32_le())
}

#[inline]
pub fn encoded_len_sfixed32(_value: i32) -> usize {
    4
}

#[inline]
pub fn encode_sfixed64<B: bytes::BufMut>(value: i64, buf: &mut B) {
    buf.put_i64_le(value);
}

#[inline]
pub fn decode_sfixed64<B: bytes::Buf>(buf: &mut B) -> Result<i64, DecodeError> {
    if buf.remaining() < 8 {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(buf.get_i64_le())
}

#[inline]
pub fn encoded_len_sfixed64(_value: i64) -> usize {
    8
}

#[inline]
pub fn encode_float<B: bytes::BufMut>(value: f32, buf: &mut B) {
    buf.put_f32_le(value);
}

#[inline]
pub fn decode_float<B: bytes::Buf>(buf: &mut B) -> Result<f32, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(buf.get_f32_le())
}

#[inline]
pub fn encoded_len_float(_value: f32) -> usize {
    4
}

#[inline]
pub fn encode_double<B: bytes::BufMut>(value: f64, buf: &mut B) {
    buf.put_f64_le(value);
}

#[inline]
pub fn decode_double<B: bytes::Buf>(buf: &mut B) -> Result<f64, DecodeError> {
    if buf.remaining() < 8 {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    Ok(buf.get_f64_le())
}

#[inline]
pub fn encoded_len_double(_value: f64) -> usize {
    8
}

// bool: a single varint, zero maps to false.

#[inline]
pub fn encode_bool<B: bytes::BufMut>(value: bool, buf: &mut B) {
    u64::from(value).encode_leb128(buf);
}

#[inline]
pub fn decode_bool<B: bytes::Buf>(buf: &mut B) -> Result<bool, DecodeError> {
    Ok(u64::decode_leb128_buf(buf)? != 0)
}

#[inline]
pub fn encoded_len_bool(_value: bool) -> usize {
    1
}

// string / bytes: length-delimited payloads.

#[inline]
pub fn encode_string<B: bytes::BufMut>(value: &str, buf: &mut B) {
    wire::encode_len(value.len(), buf);
    buf.put_slice(value.as_bytes());
}

pub fn decode_string<B: bytes::Buf>(buf: &mut B) -> Result<String, DecodeError> {
    let payload = decode_bytes(buf)?;
    String::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)
}

#[inline]
pub fn encoded_len_string(value: &str) -> usize {
    wire::encoded_len_varint(value.len() as u64) + value.len()
}

#[inline]
pub fn encode_bytes<B: bytes::BufMut>(value: &[u8], buf: &mut B) {
    wire::encode_len(value.len(), buf);
    buf.put_slice(value);
}

pub fn decode_bytes<B: bytes::Buf>(buf: &mut B) -> Result<Vec<u8>, DecodeError> {
    let len = wire::decode_len(buf)?;
    if buf.remaining() < len {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    let mut payload = vec![0u8; len];
    buf.copy_to_slice(&mut payload);
    Ok(payload)
}

#[inline]
pub fn encoded_len_bytes(value: &[u8]) -> usize {
    wire::encoded_len_varint(value.len() as u64) + value.len()
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn negative_int32_sign_extends() {
        // protoc encodes int32 -1 as ten bytes of varint.
        let mut buf = Vec::new();
        encode_int32(-1, &mut buf);
        assert_eq!(buf.len(), 10);
        assert_eq!(encoded_len_int32(-1), 10);
        assert_eq!(decode_int32(&mut &buf[..]).unwrap(), -1);
    }

    #[test]
    fn sint32_small_negatives_stay_short() {
        let mut buf = Vec::new();
        encode_sint32(-1, &mut buf);
        assert_eq!(buf, &[0x01]);

        let mut buf = Vec::new();
        encode_sint32(-2, &mut buf);
        assert_eq!(buf, &[0x03]);

        let mut buf = Vec::new();
        encode_sint32(1, &mut buf);
        assert_eq!(buf, &[0x02]);
    }

    #[test]
    fn bool_zero_is_false() {
        let mut buf = Vec::new();
        encode_bool(false, &mut buf);
        assert_eq!(buf, &[0x00]);
        assert!(!decode_bool(&mut &buf[..]).unwrap());

        // Any nonzero varint decodes to true.
        assert!(decode_bool(&mut &[0x02u8][..]).unwrap());
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        // Length 2, lone continuation bytes.
        let bytes = [0x02u8, 0xc0, 0xc1];
        assert_eq!(
            decode_string(&mut &bytes[..]),
            Err(DecodeError::InvalidUtf8)
        );
    }

    #[test]
    fn bytes_rejects_truncated_payload() {
        let bytes = [0x05u8, 1, 2];
        assert_eq!(
            decode_bytes(&mut &bytes[..]),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
    }

    proptest! {
        #[test]
        fn proptest_int32_roundtrip(val: i32) {
            let mut buf = Vec::new();
            encode_int32(val, &mut buf);
            prop_assert_eq!(buf.len(), encoded_len_int32(val));
            prop_assert_eq!(decode_int32(&mut &buf[..]).unwrap(), val);
        }

        #[test]
        fn proptest_sint64_roundtrip(val: i64) {
            let mut buf = Vec::new();
            encode_sint64(val, &mut buf);
            prop_assert_eq!(buf.len(), encoded_len_sint64(val));
            prop_assert_eq!(decode_sint64(&mut &buf[..]).unwrap(), val);
        }

        #[test]
        fn proptest_fixed_roundtrip(a: u32, b: u64, c: i32, d: i64) {
            let mut buf = Vec::new();
            encode_fixed32(a, &mut buf);
            encode_fixed64(b, &mut buf);
            encode_sfixed32(c, &mut buf);
            encode_sfixed64(d, &mut buf);
            prop_assert_eq!(buf.len(), 24);

            let mut buf = &buf[..];
            prop_assert_eq!(decode_fixed32(&mut buf).unwrap(), a);
            prop_assert_eq!(decode_fixed64(&mut buf).unwrap(), b);
            prop_assert_eq!(decode_sfixed32(&mut buf).unwrap(), c);
            prop_assert_eq!(decode_sfixed64(&mut buf).unwrap(), d);
        }

        #[test]
        fn proptest_double_roundtrip(val: f64) {
            let mut buf = Vec::new();
            encode_double(val, &mut buf);
            let rnd = decode_double(&mut &buf[..]).unwrap();
            prop_assert_eq!(val.to_bits(), rnd.to_bits());
        }

        #[test]
        fn proptest_string_roundtrip(val: String) {
            let mut buf = Vec::new();
            encode_string(&val, &mut buf);
            prop_assert_eq!(buf.len(), encoded_len_string(&val));
            prop_assert_eq!(decode_string(&mut &buf[..]).unwrap(), val);
        }

        #[test]
        fn proptest_bytes_roundtrip(val: Vec<u8>) {
            let mut buf = Vec::new();
            encode_bytes(&val, &mut buf);
            prop_assert_eq!(buf.len(), encoded_len_bytes(&val));
            prop_assert_eq!(decode_bytes(&mut &buf[..]).unwrap(), val);
        }
    }
}
