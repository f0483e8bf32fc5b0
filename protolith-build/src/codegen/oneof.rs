//! Oneof code generation.
//!
//! A oneof becomes a sum type named from the parent's flat name plus the
//! oneof name; the Rust discriminant is the selector. The parent message
//! holds one slot and one presence bit for the whole group, and setting any
//! member replaces the active variant.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use crate::ast::{FieldType, Oneof};
use crate::context::{flat_ident, ident, to_pascal_case, to_rust_field_name, GenerationContext};
use crate::error::Error;

use super::field::init_dispatch_rules;
use super::types::ValueMode;

/// The token fragments a oneof contributes to its message, plus the variant
/// enum emitted alongside it.
pub struct OneofParts {
    pub enum_def: TokenStream,
    pub slot: TokenStream,
    pub accessors: TokenStream,
    pub encode: TokenStream,
    pub len: TokenStream,
    pub decode_arms: TokenStream,
    pub init_rules: TokenStream,
}

/// Per-member layout facts shared by every fragment builder.
struct Member {
    variant: Ident,
    tag: Literal,
    declared: String,
    payload_ty: TokenStream,
    wire: TokenStream,
    encode_call: TokenStream,
    len_expr: TokenStream,
    decode_expr: TokenStream,
    getter_ty: TokenStream,
    getter_expr: TokenStream,
    boxed: bool,
}

pub fn generate_oneof(
    ctx: &GenerationContext,
    message_fqn: &str,
    oneof: &Oneof,
    mask: &TokenStream,
) -> Result<OneofParts, Error> {
    let parent = flat_ident(message_fqn);
    let enum_ident = format_ident!("{}_{}", parent, oneof.name);

    let rust_name = to_rust_field_name(&oneof.name);
    let stripped = rust_name.trim_start_matches("r#").to_string();
    let getter = ident(&rust_name);
    let slot = format_ident!("_{}", stripped);
    let set = format_ident!("set_{}", stripped);
    let has = format_ident!("has_{}", stripped);
    let reset = format_ident!("reset_{}", stripped);
    let declared = &oneof.name;

    let mut members = Vec::with_capacity(oneof.fields.len());
    for member in &oneof.fields {
        let variant = format_ident!("{}", to_pascal_case(&member.name));
        let tag = Literal::u32_suffixed(member.number);

        let built = match ctx.table.entry(&member.ty) {
            Some(entry) => {
                let payload_ty = entry.rust_type.clone();
                let encode_fn = &entry.encode_fn;
                let decode_fn = &entry.decode_fn;
                let len_fn = &entry.len_fn;
                let (value_expr, getter_ty, getter_expr) = match entry.mode {
                    ValueMode::Copy => (quote!(*value), quote!(#payload_ty), quote!(*value)),
                    ValueMode::Str => (quote!(value.as_str()), quote!(&str), quote!(value.as_str())),
                    ValueMode::Slice => (
                        quote!(value.as_slice()),
                        quote!(&[u8]),
                        quote!(value.as_slice()),
                    ),
                };
                Member {
                    variant,
                    tag,
                    declared: member.name.clone(),
                    payload_ty,
                    wire: entry.wire.tokens(),
                    encode_call: quote!(#encode_fn(#value_expr, buf)),
                    len_expr: quote!(#len_fn(#value_expr)),
                    decode_expr: quote!(#decode_fn(buf)?),
                    getter_ty,
                    getter_expr,
                    boxed: false,
                }
            }
            None => {
                let FieldType::Named(fqn) = &member.ty else {
                    unreachable!("every scalar has a table entry");
                };
                let inner = flat_ident(fqn);
                let boxed = ctx.is_boxed(message_fqn, &member.name);
                let (payload_ty, value_expr) = if boxed {
                    (
                        quote!(::protolith::alloc::boxed::Box<#inner>),
                        quote!(&**value),
                    )
                } else {
                    (quote!(#inner), quote!(value))
                };
                let decode_expr = if boxed {
                    quote!(::protolith::alloc::boxed::Box::new(
                        ::protolith::decode_message_field(buf)?
                    ))
                } else {
                    quote!(::protolith::decode_message_field(buf)?)
                };
                Member {
                    variant,
                    tag,
                    declared: member.name.clone(),
                    payload_ty,
                    wire: quote!(::protolith::wire::WireType::Len),
                    encode_call: quote!(::protolith::encode_message_field(#value_expr, buf)),
                    len_expr: quote!(::protolith::encoded_message_field_len(#value_expr)),
                    decode_expr,
                    getter_ty: quote!(&#inner),
                    getter_expr: value_expr,
                    boxed,
                }
            }
        };
        members.push(built);
    }

    let vis = &ctx.vis;

    // The variant enum. The parent stores it behind an `Option` (absent by
    // default), so no variant is ever conjured out of `Default` — a member
    // payload may be a boxed recursive message.
    let variants = members.iter().map(|m| {
        let variant = &m.variant;
        let payload_ty = &m.payload_ty;
        quote!(#variant(#payload_ty),)
    });
    let enum_def = quote! {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, PartialEq)]
        #vis enum #enum_ident {
            #(#variants)*
        }
    };

    // Group accessors on the parent, plus one presence-aware accessor pair
    // per member: setting any member overwrites the variant, reading an
    // inactive member raises the presence error.
    let member_accessors = members.iter().map(|m| {
        let variant = &m.variant;
        let member_rust = to_rust_field_name(&m.declared);
        let member_stripped = member_rust.trim_start_matches("r#").to_string();
        let member_getter = ident(&member_rust);
        let member_set = format_ident!("set_{}", member_stripped);
        let member_has = format_ident!("has_{}", member_stripped);
        let member_declared = &m.declared;
        let getter_ty = &m.getter_ty;
        let getter_expr = &m.getter_expr;
        let payload_ty = &m.payload_ty;
        let stored = if m.boxed {
            quote!(::core::convert::Into::into(value))
        } else {
            quote!(value.into())
        };
        let set_param = if m.boxed {
            let unboxed: TokenStream = quote!(#payload_ty);
            // Box<T>: From<T>, so the setter takes anything convertible.
            quote!(value: impl ::core::convert::Into<#unboxed>)
        } else {
            quote!(value: impl ::core::convert::Into<#payload_ty>)
        };
        quote! {
            pub fn #member_getter(&self) -> ::core::result::Result<#getter_ty, ::protolith::PresenceError> {
                if (self.presence & #mask) != 0 {
                    if let ::core::option::Option::Some(#enum_ident::#variant(value)) = &self.#slot {
                        return Ok(#getter_expr);
                    }
                }
                Err(::protolith::PresenceError::new(#member_declared))
            }
            pub fn #member_set(&mut self, #set_param) {
                self.#slot = ::core::option::Option::Some(#enum_ident::#variant(#stored));
                self.presence |= #mask;
            }
            pub fn #member_has(&self) -> bool {
                (self.presence & #mask) != 0
                    && matches!(&self.#slot, ::core::option::Option::Some(#enum_ident::#variant(_)))
            }
        }
    });

    let accessors = quote! {
        pub fn #getter(&self) -> ::core::result::Result<&#enum_ident, ::protolith::PresenceError> {
            if (self.presence & #mask) != 0 {
                if let ::core::option::Option::Some(value) = &self.#slot {
                    return Ok(value);
                }
            }
            Err(::protolith::PresenceError::new(#declared))
        }
        pub fn #set(&mut self, value: #enum_ident) {
            self.#slot = ::core::option::Option::Some(value);
            self.presence |= #mask;
        }
        pub fn #has(&self) -> bool {
            (self.presence & #mask) != 0
        }
        pub fn #reset(&mut self) {
            self.presence &= !#mask;
            self.#slot = ::core::option::Option::None;
        }
        #(#member_accessors)*
    };

    // Exactly the active member goes on the wire.
    let encode_arms = members.iter().map(|m| {
        let variant = &m.variant;
        let tag = &m.tag;
        let wire = &m.wire;
        let encode_call = &m.encode_call;
        quote! {
            #enum_ident::#variant(value) => {
                ::protolith::wire::encode_key(#wire, #tag, buf);
                #encode_call;
            }
        }
    });
    let encode = quote! {
        if (self.presence & #mask) != 0 {
            if let ::core::option::Option::Some(active) = &self.#slot {
                match active {
                    #(#encode_arms)*
                }
            }
        }
    };

    let len_arms = members.iter().map(|m| {
        let variant = &m.variant;
        let tag = &m.tag;
        let len_expr = &m.len_expr;
        quote! {
            #enum_ident::#variant(value) => {
                len += ::protolith::wire::encoded_key_len(#tag);
                len += #len_expr;
            }
        }
    });
    let len = quote! {
        if (self.presence & #mask) != 0 {
            if let ::core::option::Option::Some(active) = &self.#slot {
                match active {
                    #(#len_arms)*
                }
            }
        }
    };

    // Last member observed on the wire wins.
    let decode_arm_list = members.iter().map(|m| {
        let variant = &m.variant;
        let tag = &m.tag;
        let decode_expr = &m.decode_expr;
        quote! {
            #tag => {
                msg.#set(#enum_ident::#variant(#decode_expr));
            }
        }
    });
    let decode_arms = quote!(#(#decode_arm_list)*);

    // The oneof itself and each member are all settable through init.
    let mut init_rules = init_dispatch_rules(declared, |value| quote!($msg.#set(#value)));
    for m in &members {
        let member_set = format_ident!(
            "set_{}",
            to_rust_field_name(&m.declared).trim_start_matches("r#")
        );
        init_rules.extend(init_dispatch_rules(&m.declared, |value| {
            quote!($msg.#member_set(#value))
        }));
    }

    Ok(OneofParts {
        enum_def,
        slot: quote!(#slot: ::core::option::Option<#enum_ident>,),
        accessors,
        encode,
        len,
        decode_arms,
        init_rules,
    })
}
