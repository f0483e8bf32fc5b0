//! The type mapping table: proto type token to emitted type and codec
//! identities.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::ast::FieldType;
use crate::context::flat_ident;
use crate::resolver::{TypeKind, TypeSet};

/// Wire type of a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Varint,
    I64,
    Len,
    I32,
}

impl WireKind {
    /// The `protolith::wire::WireType` variant generated code names.
    pub fn tokens(self) -> TokenStream {
        match self {
            WireKind::Varint => quote!(::protolith::wire::WireType::Varint),
            WireKind::I64 => quote!(::protolith::wire::WireType::I64),
            WireKind::Len => quote!(::protolith::wire::WireType::Len),
            WireKind::I32 => quote!(::protolith::wire::WireType::I32),
        }
    }

    /// Repeated fields of this wire type pack into one length-delimited
    /// payload. Length-delimited values never pack.
    pub fn packable(self) -> bool {
        !matches!(self, WireKind::Len)
    }
}

/// How generated code hands a stored value to its codec functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Pass by value (`Copy` scalars and generated enums).
    Copy,
    /// Borrow as `&str`.
    Str,
    /// Borrow as a slice (`&[u8]`).
    Slice,
}

/// One table entry: the emitted Rust type plus its codec identities.
#[derive(Clone)]
pub struct TypeEntry {
    pub rust_type: TokenStream,
    pub encode_fn: TokenStream,
    pub decode_fn: TokenStream,
    pub len_fn: TokenStream,
    pub wire: WireKind,
    pub mode: ValueMode,
}

/// Lookup from proto type token (scalar keyword or FQN) to [`TypeEntry`].
///
/// Messages are deliberately absent: a miss routes the generator through
/// the length-delimited sub-message protocol. Built fresh per compilation.
pub struct TypeTable {
    entries: HashMap<String, TypeEntry>,
}

impl TypeTable {
    pub fn new(types: &TypeSet) -> Self {
        let mut entries = HashMap::new();

        let mut scalar = |keyword: &str, rust_type: TokenStream, wire: WireKind, mode: ValueMode| {
            let encode = format_ident!("encode_{}", keyword);
            let decode = format_ident!("decode_{}", keyword);
            let len = format_ident!("encoded_len_{}", keyword);
            entries.insert(
                keyword.to_string(),
                TypeEntry {
                    rust_type,
                    encode_fn: quote!(::protolith::scalar::#encode),
                    decode_fn: quote!(::protolith::scalar::#decode),
                    len_fn: quote!(::protolith::scalar::#len),
                    wire,
                    mode,
                },
            );
        };

        scalar("int32", quote!(i32), WireKind::Varint, ValueMode::Copy);
        scalar("int64", quote!(i64), WireKind::Varint, ValueMode::Copy);
        scalar("uint32", quote!(u32), WireKind::Varint, ValueMode::Copy);
        scalar("uint64", quote!(u64), WireKind::Varint, ValueMode::Copy);
        scalar("sint32", quote!(i32), WireKind::Varint, ValueMode::Copy);
        scalar("sint64", quote!(i64), WireKind::Varint, ValueMode::Copy);
        scalar("fixed32", quote!(u32), WireKind::I32, ValueMode::Copy);
        scalar("fixed64", quote!(u64), WireKind::I64, ValueMode::Copy);
        scalar("sfixed32", quote!(i32), WireKind::I32, ValueMode::Copy);
        scalar("sfixed64", quote!(i64), WireKind::I64, ValueMode::Copy);
        scalar("float", quote!(f32), WireKind::I32, ValueMode::Copy);
        scalar("double", quote!(f64), WireKind::I64, ValueMode::Copy);
        scalar("bool", quote!(bool), WireKind::Varint, ValueMode::Copy);
        scalar(
            "string",
            quote!(::protolith::alloc::string::String),
            WireKind::Len,
            ValueMode::Str,
        );
        scalar(
            "bytes",
            quote!(::protolith::alloc::vec::Vec<u8>),
            WireKind::Len,
            ValueMode::Slice,
        );

        // User-defined enums ride the varint wire with codec identities
        // derived from their flat generated name.
        for (fqn, kind) in types.iter() {
            if kind == TypeKind::Enum {
                let ident = flat_ident(fqn);
                entries.insert(
                    fqn.clone(),
                    TypeEntry {
                        rust_type: quote!(#ident),
                        encode_fn: quote!(#ident::encode),
                        decode_fn: quote!(#ident::decode),
                        len_fn: quote!(#ident::encoded_len),
                        wire: WireKind::Varint,
                        mode: ValueMode::Copy,
                    },
                );
            }
        }

        Self { entries }
    }

    /// Look up a resolved field type. `None` means "message": the caller
    /// uses the embedded-message protocol instead.
    pub fn entry(&self, ty: &FieldType) -> Option<&TypeEntry> {
        match ty {
            FieldType::Scalar(scalar) => self.entries.get(scalar.keyword()),
            FieldType::Named(fqn) => self.entries.get(fqn.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Scalar;

    fn empty_types() -> TypeSet {
        TypeSet::default()
    }

    #[test]
    fn scalar_entries_match_the_wire_table() {
        let table = TypeTable::new(&empty_types());

        let entry = table.entry(&FieldType::Scalar(Scalar::Int32)).unwrap();
        assert_eq!(entry.wire, WireKind::Varint);
        assert_eq!(entry.rust_type.to_string(), "i32");

        let entry = table.entry(&FieldType::Scalar(Scalar::Sfixed32)).unwrap();
        assert_eq!(entry.wire, WireKind::I32);
        assert_eq!(entry.rust_type.to_string(), "i32");

        let entry = table.entry(&FieldType::Scalar(Scalar::Double)).unwrap();
        assert_eq!(entry.wire, WireKind::I64);

        let entry = table.entry(&FieldType::Scalar(Scalar::Bytes)).unwrap();
        assert_eq!(entry.wire, WireKind::Len);
        assert!(!entry.wire.packable());
    }

    #[test]
    fn messages_are_absent() {
        let table = TypeTable::new(&empty_types());
        assert!(table
            .entry(&FieldType::Named("pkg.Missing".to_string()))
            .is_none());
    }

    #[test]
    fn sint_entries_use_the_zigzag_codec() {
        let table = TypeTable::new(&empty_types());
        let entry = table.entry(&FieldType::Scalar(Scalar::Sint32)).unwrap();
        assert!(entry.encode_fn.to_string().contains("encode_sint32"));
        assert_eq!(entry.wire, WireKind::Varint);
    }
}
