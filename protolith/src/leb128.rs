//! LEB128 variable-length integer encoding/decoding.

// This module uses `as` casts which have been reviewed for correctness.
#![allow(clippy::as_conversions)]

use crate::error::DecodeError;

/// Integers that can be encoded as a LEB128 varint.
pub trait LebCodec: Sized {
    /// Maximum number of bytes a valid encoding of `Self` can occupy.
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 varint from the front of `buf`, advancing past it.
    ///
    /// Fails with [`DecodeError::UnexpectedEndOfBuffer`] if the buffer runs
    /// out mid-varint and [`DecodeError::InvalidVarint`] if the continuation
    /// bit never clears within [`LebCodec::MAX_LEB_BYTES`] or the final byte
    /// overflows `Self`.
    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError>;

    /// Encode `self` as a LEB128 varint into `buf`.
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B);

    /// The number of bytes `encode_leb128` would write.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: usize = 10;

    #[inline]
    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        let mut value: u64 = 0;
        for i in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeError::UnexpectedEndOfBuffer);
            }
            let byte = buf.get_u8();
            if i == 9 {
                // 9 * 7 = 63 bits consumed, so only the low bit may remain.
                if byte > 0x01 {
                    return Err(DecodeError::InvalidVarint);
                }
                return Ok(value | (u64::from(byte) << 63));
            }
            value |= u64::from(byte & 0x7f) << (i * 7);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidVarint)
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) {
        let mut value = self;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                buf.put_u8(byte);
                return;
            }
            buf.put_u8(byte | 0x80);
        }
    }

    /// LEB128 packs 7 bits per byte, so the encoded length is
    /// `ceil(significant_bits / 7)` with a minimum of one byte. A lookup on
    /// `leading_zeros` avoids the division.
    #[inline]
    fn encoded_leb128_len(self) -> usize {
        #[rustfmt::skip]
        const LZ_TO_LEN: [u8; 65] = [
            10,
            9, 9, 9, 9, 9, 9, 9,
            8, 8, 8, 8, 8, 8, 8,
            7, 7, 7, 7, 7, 7, 7,
            6, 6, 6, 6, 6, 6, 6,
            5, 5, 5, 5, 5, 5, 5,
            4, 4, 4, 4, 4, 4, 4,
            3, 3, 3, 3, 3, 3, 3,
            2, 2, 2, 2, 2, 2, 2,
            1, 1, 1, 1, 1, 1, 1, 1,
        ];

        // leading_zeros() is always 0..=64 for u64, so the index is in bounds.
        LZ_TO_LEN[self.leading_zeros() as usize] as usize
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: usize = 5;

    #[inline]
    fn decode_leb128_buf<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        let mut value: u32 = 0;
        for i in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeError::UnexpectedEndOfBuffer);
            }
            let byte = buf.get_u8();
            if i == 4 {
                // 4 * 7 = 28 bits consumed, so only the low nibble may remain.
                if byte > 0x0f {
                    return Err(DecodeError::InvalidVarint);
                }
                return Ok(value | (u32::from(byte) << 28));
            }
            value |= u32::from(byte & 0x7f) << (i * 7);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidVarint)
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) {
        let mut value = self;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                buf.put_u8(byte);
                return;
            }
            buf.put_u8(byte | 0x80);
        }
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        #[rustfmt::skip]
        const LZ_TO_LEN: [u8; 33] = [
            5, 5, 5, 5,
            4, 4, 4, 4, 4, 4, 4,
            3, 3, 3, 3, 3, 3, 3,
            2, 2, 2, 2, 2, 2, 2,
            1, 1, 1, 1, 1, 1, 1, 1,
        ];

        LZ_TO_LEN[self.leading_zeros() as usize] as usize
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use proptest::prelude::*;

    use super::LebCodec;
    use crate::error::DecodeError;

    #[test]
    fn smoketest_leb128_u64() {
        #[track_caller]
        fn test_case(val: u64, len: usize) {
            let mut buffer = Vec::new();
            val.encode_leb128(&mut buffer);
            assert_eq!(buffer.len(), len, "invalid encoded length");
            assert_eq!(val.encoded_leb128_len(), len, "invalid computed length");

            let rnd = u64::decode_leb128_buf(&mut &buffer[..]).unwrap();
            assert_eq!(rnd, val, "invalid value");
        }

        test_case(0, 1);
        test_case(1, 1);
        test_case(127, 1);
        test_case(128, 2);
        test_case(300, 2);
        // First value that needs nine payload chunks.
        test_case(72057594037927937, 9);
        test_case(u64::MAX, 10);
    }

    #[test]
    fn smoketest_leb128_u32() {
        #[track_caller]
        fn test_case(val: u32, len: usize) {
            let mut buffer = Vec::new();
            val.encode_leb128(&mut buffer);
            assert_eq!(buffer.len(), len, "invalid encoded length");
            assert_eq!(val.encoded_leb128_len(), len, "invalid computed length");

            let rnd = u32::decode_leb128_buf(&mut &buffer[..]).unwrap();
            assert_eq!(rnd, val, "invalid value");
        }

        test_case(0, 1);
        test_case(42, 1);
        test_case(128, 2);
        test_case(u32::MAX, 5);
    }

    #[test]
    fn overlong_varint_is_rejected() {
        // Eleven continuation bytes never terminate a u64.
        let bytes = [0xffu8; 11];
        assert_eq!(
            u64::decode_leb128_buf(&mut &bytes[..]),
            Err(DecodeError::InvalidVarint)
        );

        // Tenth byte may only carry the final bit.
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        assert_eq!(
            u64::decode_leb128_buf(&mut &bytes[..]),
            Err(DecodeError::InvalidVarint)
        );
    }

    #[test]
    fn truncated_varint_is_rejected() {
        let bytes = [0x80u8, 0x80];
        assert_eq!(
            u64::decode_leb128_buf(&mut &bytes[..]),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
        assert_eq!(
            u64::decode_leb128_buf(&mut &[][..]),
            Err(DecodeError::UnexpectedEndOfBuffer)
        );
    }

    proptest! {
        #[test]
        fn proptest_leb128_u64(val: u64) {
            let mut buffer = Vec::new();
            val.encode_leb128(&mut buffer);
            prop_assert_eq!(buffer.len(), val.encoded_leb128_len());

            let rnd = u64::decode_leb128_buf(&mut &buffer[..]).unwrap();
            prop_assert_eq!(rnd, val);
        }

        #[test]
        fn proptest_leb128_u32(val: u32) {
            let mut buffer = Vec::new();
            val.encode_leb128(&mut buffer);
            prop_assert_eq!(buffer.len(), val.encoded_leb128_len());

            let rnd = u32::decode_leb128_buf(&mut &buffer[..]).unwrap();
            prop_assert_eq!(rnd, val);
        }
    }
}
