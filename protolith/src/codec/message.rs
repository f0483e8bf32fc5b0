//! Message-level trait and helpers.

use crate::error::DecodeError;
use crate::wire;

/// Trait implemented by every generated message record.
///
/// The body methods deal in the unprefixed wire form; the free functions
/// [`write`] and [`read`] layer the optional length prefix / size bound on
/// top.
pub trait Message: Default {
    /// The number of bytes the message body occupies on the wire, without
    /// any outer length prefix.
    fn encoded_len(&self) -> usize;

    /// Encode the message body (without length prefix).
    fn encode_body<B: bytes::BufMut>(&self, buf: &mut B);

    /// Decode a message body, consuming `buf` to its end.
    ///
    /// Fields absent from the wire stay absent from the record; proto3 has
    /// no required fields, so a partially populated record is a valid
    /// result.
    fn decode_body<B: bytes::Buf>(buf: &mut B) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

/// Encode `msg` into `buf`, optionally preceded by its length as a varint.
///
/// Polymorphic over every generated message type. Encoding is total over a
/// well-typed instance: it cannot fail.
pub fn write<M: Message, B: bytes::BufMut>(msg: &M, buf: &mut B, prepend_len: bool) {
    if prepend_len {
        wire::encode_len(msg.encoded_len(), buf);
    }
    msg.encode_body(buf);
}

/// Decode a message of type `M` from `buf`.
///
/// A `max_size` of zero means "read until end of stream"; otherwise exactly
/// `max_size` bytes are consumed and decoding is bounded to them.
pub fn read<M: Message, B: bytes::Buf>(buf: &mut B, max_size: usize) -> Result<M, DecodeError> {
    if max_size == 0 {
        return M::decode_body(buf);
    }
    if buf.remaining() < max_size {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    let mut body = buf.copy_to_bytes(max_size);
    M::decode_body(&mut body)
}

/// Encode a message as a length-delimited field payload.
///
/// This is the embedded sub-message protocol: length prefix, then body.
#[inline]
pub fn encode_message_field<M: Message, B: bytes::BufMut>(msg: &M, buf: &mut B) {
    wire::encode_len(msg.encoded_len(), buf);
    msg.encode_body(buf);
}

/// Returns the encoded length of a message as a length-delimited payload.
#[inline]
#[allow(clippy::as_conversions)]
pub fn encoded_message_field_len<M: Message>(msg: &M) -> usize {
    let msg_len = msg.encoded_len();
    wire::encoded_len_varint(msg_len as u64) + msg_len
}

/// Decode a message from a length-delimited field payload.
///
/// Reads the length prefix and recurses with exactly that bound, so a
/// malformed sub-message can never consume its parent's bytes.
#[inline]
pub fn decode_message_field<M: Message, B: bytes::Buf>(buf: &mut B) -> Result<M, DecodeError> {
    let len = wire::decode_len(buf)?;
    if buf.remaining() < len {
        return Err(DecodeError::UnexpectedEndOfBuffer);
    }
    let mut body = buf.copy_to_bytes(len);
    M::decode_body(&mut body)
}
