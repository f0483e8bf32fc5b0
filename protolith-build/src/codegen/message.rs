//! Message record code generation.
//!
//! Each message emits, in order: its record struct (presence bitset plus
//! one prefixed slot per field or oneof), presence-aware accessors, a
//! `Message` impl carrying the encode/length/decode triple, an `init_*`
//! constructor macro, and then its oneof enums and nested declarations as
//! flat-named siblings.

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use crate::ast::{Message, MessageItem};
use crate::context::{flat_ident, GenerationContext};
use crate::error::Error;

use super::enumeration::generate_enum;
use super::field::generate_field;
use super::oneof::generate_oneof;

/// Most direct members a record can hold: one bit each in a `u128` bitset.
const MAX_DIRECT_FIELDS: usize = 128;

/// Generate the record and codecs for `message`, then recurse into its
/// nested declarations.
pub fn generate_message(ctx: &GenerationContext, message: &Message) -> Result<TokenStream, Error> {
    let fqn = message.name.as_str();
    let struct_ident = flat_ident(fqn);
    let macro_ident = format_ident!("init_{}", struct_ident);
    let vis = &ctx.vis;

    let field_count = message.items.len();
    let (presence_ty, one) = presence_type(field_count).ok_or_else(|| Error::TooManyFields {
        message: fqn.to_string(),
        count: field_count,
    })?;

    let mut slots = Vec::new();
    let mut accessors = Vec::new();
    let mut encodes = Vec::new();
    let mut lens = Vec::new();
    let mut decode_arms = Vec::new();
    let mut init_rules = Vec::new();
    let mut oneof_enums = Vec::new();

    for (index, item) in message.items.iter().enumerate() {
        let idx = Literal::u32_suffixed(u32::try_from(index).expect("checked field count"));
        let mask = quote!((#one << #idx));
        match item {
            MessageItem::Field(field) => {
                let parts = generate_field(ctx, fqn, field, &mask)?;
                slots.push(parts.slot);
                accessors.push(parts.accessors);
                encodes.push(parts.encode);
                lens.push(parts.len);
                decode_arms.push(parts.decode_arm);
                init_rules.push(parts.init_rules);
            }
            MessageItem::Oneof(oneof) => {
                let parts = generate_oneof(ctx, fqn, oneof, &mask)?;
                slots.push(parts.slot);
                accessors.push(parts.accessors);
                encodes.push(parts.encode);
                lens.push(parts.len);
                decode_arms.push(parts.decode_arms);
                init_rules.push(parts.init_rules);
                oneof_enums.push(parts.enum_def);
            }
        }
    }

    // Encode of a fieldless record writes nothing; keep the buffer used.
    let encode_epilogue = if encodes.is_empty() {
        quote!(let _ = buf;)
    } else {
        quote!()
    };

    // A plain `pub use` of a `macro_rules!` can re-export it no further
    // than the crate unless the macro itself is `#[macro_export]`-ed; in
    // that case `#[macro_export]` alone already places it at the crate
    // root, so the `use` would just redeclare the same name in this module.
    let is_unrestricted_pub = vis.to_string() == "pub";
    let macro_export_attr = if is_unrestricted_pub {
        quote!(#[macro_export])
    } else {
        quote!()
    };
    let macro_export = if vis.is_empty() || is_unrestricted_pub {
        quote!()
    } else {
        quote! {
            #[allow(unused_imports)]
            #vis use #macro_ident;
        }
    };

    let mut tokens = quote! {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Default, PartialEq)]
        #vis struct #struct_ident {
            presence: #presence_ty,
            #(#slots)*
        }

        #[allow(dead_code)]
        impl #struct_ident {
            #(#accessors)*

            /// Decode from `buf`; a `max_size` of zero reads to the end of
            /// the stream.
            pub fn read<B: ::protolith::bytes::Buf>(
                buf: &mut B,
                max_size: usize,
            ) -> ::core::result::Result<Self, ::protolith::DecodeError> {
                ::protolith::read(buf, max_size)
            }
        }

        impl ::protolith::Message for #struct_ident {
            fn encoded_len(&self) -> usize {
                #[allow(unused_mut)]
                let mut len = 0usize;
                #(#lens)*
                len
            }

            fn encode_body<B: ::protolith::bytes::BufMut>(&self, buf: &mut B) {
                #encode_epilogue
                #(#encodes)*
            }

            fn decode_body<B: ::protolith::bytes::Buf>(
                buf: &mut B,
            ) -> ::core::result::Result<Self, ::protolith::DecodeError> {
                #[allow(unused_mut)]
                let mut msg = Self::default();
                while buf.has_remaining() {
                    let (tag, wire_type) = ::protolith::wire::decode_key(buf)?;
                    match tag {
                        #(#decode_arms)*
                        _ => ::protolith::wire::skip_field(wire_type, buf)?,
                    }
                }
                Ok(msg)
            }
        }

        #[allow(unused_macros)]
        #macro_export_attr
        macro_rules! #macro_ident {
            #(#init_rules)*
            (@set $msg:ident, $other:ident, $value:expr) => {
                compile_error!(concat!(
                    "message `", #fqn, "` has no field named `", stringify!($other), "`"
                ))
            };
            ($($field:ident = $value:expr),* $(,)?) => {{
                #[allow(unused_mut)]
                let mut msg = <#struct_ident as ::core::default::Default>::default();
                $( #macro_ident!(@set msg, $field, $value); )*
                msg
            }};
        }
        #macro_export

        #(#oneof_enums)*
    };

    // Nested declarations emit as flat-named siblings.
    for decl in &message.enums {
        tokens.extend(generate_enum(ctx, decl)?);
    }
    for nested in &message.messages {
        tokens.extend(generate_message(ctx, nested)?);
    }

    Ok(tokens)
}

/// Pick the narrowest unsigned integer able to hold one presence bit per
/// direct field, along with its `1` literal for mask building.
fn presence_type(field_count: usize) -> Option<(TokenStream, TokenStream)> {
    let picked = match field_count {
        0..=8 => (quote!(u8), quote!(1u8)),
        9..=16 => (quote!(u16), quote!(1u16)),
        17..=32 => (quote!(u32), quote!(1u32)),
        33..=64 => (quote!(u64), quote!(1u64)),
        65..=MAX_DIRECT_FIELDS => (quote!(u128), quote!(1u128)),
        _ => return None,
    };
    Some(picked)
}
