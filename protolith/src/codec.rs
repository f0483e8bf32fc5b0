//! Encoding and decoding routines for the protobuf wire format.
//!
//! The [`scalar`] module holds one encode/decode/length triple per proto
//! scalar type; generated code is wired to them through the compile-time
//! type mapping table. The [`message`] module holds the [`Message`] trait
//! that every generated record implements, plus the helpers for embedded
//! (length-prefixed) message fields.
//!
//! [`Message`]: message::Message

pub mod message;
pub mod scalar;
