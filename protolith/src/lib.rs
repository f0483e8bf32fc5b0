#![no_std]
#![deny(clippy::as_conversions)]

pub extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod codec;
pub mod error;
pub mod leb128;
pub mod wire;

pub use bytes;

pub use codec::message::{
    decode_message_field, encode_message_field, encoded_message_field_len, read, write, Message,
};
pub use codec::scalar;
pub use error::{DecodeError, PresenceError};

#[cfg(feature = "macros")]
pub use protolith_macros::{proto, proto_file};
