//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).

// Key splitting and wire-type dispatch use reviewed `as` casts.
#![allow(clippy::as_conversions)]

use crate::error::DecodeError;
use crate::leb128::LebCodec;

/// Minimum value of a protobuf field tag.
pub const MINIMUM_TAG: u32 = 1;
/// Maximum value of a protobuf field tag.
pub const MAXIMUM_TAG: u32 = (1 << 29) - 1;

/// Denotes the type of a field in an encoded protobuf message.
///
/// Each field record starts with a key combining the tag and a [`WireType`];
/// the wire type determines how large the following payload is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `int64`, `uint32`, `uint64`, `sint32`, `sint64`, `bool`, `enum`.
    Varint = 0,
    /// 64-bit integer.
    ///
    /// Used for: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Variable length field.
    ///
    /// Used for: `string`, `bytes`, `message`, packed `repeated` fields.
    Len = 2,
    /// Group start (deprecated).
    SGroup = 3,
    /// Group end (deprecated).
    EGroup = 4,
    /// 32-bit integer.
    ///
    /// Used for: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

impl WireType {
    /// Try to decode a [`WireType`] from the low three bits of a key.
    #[inline]
    pub fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            _ => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    #[inline]
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}

/// Encodes the provided tag and wire type as a protobuf field key.
///
/// Hot path for encoding, called for every field in every message.
#[inline]
pub fn encode_key<B: bytes::BufMut>(wire_type: WireType, tag: u32, buf: &mut B) {
    let key = (tag << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf);
}

/// Returns the encoded length of a field key (tag + wire type).
///
/// The wire type only occupies the low three bits, so it never changes the
/// length.
#[inline]
pub fn encoded_key_len(tag: u32) -> usize {
    (tag << 3).encoded_leb128_len()
}

/// Decodes a field key into its tag and [`WireType`] components.
///
/// Keys always fit in a `u32`: the maximum tag is `2^29 - 1`, so the maximum
/// key is `u32::MAX`.
#[inline]
pub fn decode_key<B: bytes::Buf>(buf: &mut B) -> Result<(u32, WireType), DecodeError> {
    let key = u32::decode_leb128_buf(buf)?;
    let wire_type = WireType::try_from_val((key & 0b111) as u8)?;
    let tag = key >> 3;
    if tag < MINIMUM_TAG {
        return Err(DecodeError::TagOutOfRange);
    }
    Ok((tag, wire_type))
}

/// Encodes the length prefix for a length-delimited field.
#[inline]
pub fn encode_len<B: bytes::BufMut>(len: usize, buf: &mut B) {
    (len as u64).encode_leb128(buf);
}

/// Decodes the length prefix for a length-delimited field.
#[inline]
pub fn decode_len<B: bytes::Buf>(buf: &mut B) -> Result<usize, DecodeError> {
    let len = u64::decode_leb128_buf(buf)?;
    usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })
}

/// Returns the number of bytes a varint encoding of `value` occupies.
#[inline]
pub fn encoded_len_varint(value: u64) -> usize {
    value.encoded_leb128_len()
}

/// Skips over a field value based on its wire type.
///
/// Unknown fields are not errors: skipping them preserves forwards
/// compatibility with schemas that have since grown new fields.
#[inline]
pub fn skip_field<B: bytes::Buf>(wire_type: WireType, buf: &mut B) -> Result<(), DecodeError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            // Read and discard, decode_leb128_buf advances the buffer.
            u64::decode_leb128_buf(buf)?;
            return Ok(());
        }
        WireType::I64 => 8,
        WireType::Len => decode_len(buf)?,
        WireType::I32 => 4,
        WireType::SGroup | WireType::EGroup => {
            return Err(DecodeError::DeprecatedGroupEncoding);
        }
    };

    if buf.remaining() < skip_len {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    buf.advance(skip_len);
    Ok(())
}
