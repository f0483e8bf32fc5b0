//! Enum code generation.
//!
//! Enums are open on the wire: numbers outside the declared set decode into
//! an `Unrecognized` sentinel that round-trips by its numeric value, so a
//! message compiled against an older schema survives newer peers.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::ast::Enum;
use crate::context::{flat_ident, to_pascal_case, GenerationContext};
use crate::error::Error;

/// Generate the Rust enum plus its codec triple for a resolved proto enum.
pub fn generate_enum(ctx: &GenerationContext, decl: &Enum) -> Result<TokenStream, Error> {
    let enum_ident = flat_ident(&decl.name);
    let vis = &ctx.vis;

    let mut variants = Vec::with_capacity(decl.values.len());
    let mut from_arms = Vec::with_capacity(decl.values.len());
    let mut to_arms = Vec::with_capacity(decl.values.len());
    for value in &decl.values {
        let variant = format_ident!("{}", to_pascal_case(&value.name));
        let number = proc_macro2::Literal::i32_suffixed(value.number);
        from_arms.push(quote!(#number => Self::#variant,));
        to_arms.push(quote!(Self::#variant => #number,));
        variants.push(variant);
    }

    Ok(quote! {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #vis enum #enum_ident {
            #(#variants,)*
            /// Wire value not declared in the schema, kept for round-tripping.
            Unrecognized(i32),
        }

        #[allow(dead_code)]
        impl #enum_ident {
            pub fn from_i32(value: i32) -> Self {
                match value {
                    #(#from_arms)*
                    other => Self::Unrecognized(other),
                }
            }

            pub fn to_i32(self) -> i32 {
                match self {
                    #(#to_arms)*
                    Self::Unrecognized(other) => other,
                }
            }

            pub fn encode<B: ::protolith::bytes::BufMut>(self, buf: &mut B) {
                ::protolith::scalar::encode_int32(self.to_i32(), buf);
            }

            pub fn decode<B: ::protolith::bytes::Buf>(
                buf: &mut B,
            ) -> ::core::result::Result<Self, ::protolith::DecodeError> {
                Ok(Self::from_i32(::protolith::scalar::decode_int32(buf)?))
            }

            pub fn encoded_len(self) -> usize {
                ::protolith::scalar::encoded_len_int32(self.to_i32())
            }
        }

        impl ::core::default::Default for #enum_ident {
            fn default() -> Self {
                // proto3 guarantees a declared zero value.
                Self::from_i32(0)
            }
        }
    })
}
