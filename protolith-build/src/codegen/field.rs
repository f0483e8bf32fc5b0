//! Per-field code generation: backing slot, presence-aware accessors,
//! encode/length/decode fragments, and init-macro dispatch rules.

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use crate::ast::{Field, FieldType};
use crate::context::{flat_ident, ident, to_rust_field_name, GenerationContext};
use crate::error::Error;

use super::types::{TypeEntry, ValueMode};

/// The token fragments a single field contributes to its message.
pub struct FieldParts {
    pub slot: TokenStream,
    pub accessors: TokenStream,
    pub encode: TokenStream,
    pub len: TokenStream,
    pub decode_arm: TokenStream,
    pub init_rules: TokenStream,
}

/// Identifier bundle shared by plain fields and oneof members.
pub(crate) struct FieldNames {
    pub getter: proc_macro2::Ident,
    pub slot: proc_macro2::Ident,
    pub set: proc_macro2::Ident,
    pub has: proc_macro2::Ident,
    pub reset: proc_macro2::Ident,
    /// The declared proto name, used in presence errors.
    pub declared: String,
}

pub(crate) fn field_names(field: &Field) -> FieldNames {
    let rust_name = to_rust_field_name(&field.name);
    let stripped = rust_name.trim_start_matches("r#").to_string();
    FieldNames {
        getter: ident(&rust_name),
        slot: format_ident!("_{}", stripped),
        set: format_ident!("set_{}", stripped),
        has: format_ident!("has_{}", stripped),
        reset: format_ident!("reset_{}", stripped),
        declared: field.name.clone(),
    }
}

/// The `@set` dispatch rules an init macro carries for one settable name.
///
/// Both the declared spelling and its snake_case folding are accepted, per
/// the generation-time canonicalization rule.
pub(crate) fn init_dispatch_rules(
    declared: &str,
    set_call: impl Fn(TokenStream) -> TokenStream,
) -> TokenStream {
    let declared_ident = ident(declared);
    let folded = to_rust_field_name(declared);
    let call = set_call(quote!($value));

    let mut rules = quote! {
        (@set $msg:ident, #declared_ident, $value:expr) => { #call };
    };
    if folded != declared {
        let folded_ident = ident(&folded);
        rules.extend(quote! {
            (@set $msg:ident, #folded_ident, $value:expr) => { #call };
        });
    }
    rules
}

/// Generate every fragment for one plain (non-oneof) field.
pub fn generate_field(
    ctx: &GenerationContext,
    message_fqn: &str,
    field: &Field,
    mask: &TokenStream,
) -> Result<FieldParts, Error> {
    let names = field_names(field);
    let tag = Literal::u32_suffixed(field.number);

    match ctx.table.entry(&field.ty) {
        Some(entry) => {
            if field.repeated {
                Ok(repeated_entry_field(&names, entry, &tag, mask))
            } else {
                Ok(singular_entry_field(&names, entry, &tag, mask))
            }
        }
        // Absent from the table: a message, routed through the
        // length-delimited sub-message protocol.
        None => {
            let FieldType::Named(fqn) = &field.ty else {
                unreachable!("every scalar has a table entry");
            };
            let inner = flat_ident(fqn);
            if field.repeated {
                Ok(repeated_message_field(&names, &inner, &tag, mask))
            } else {
                let boxed = ctx.is_boxed(message_fqn, &field.name);
                Ok(singular_message_field(&names, &inner, &tag, mask, boxed))
            }
        }
    }
}

fn singular_entry_field(
    names: &FieldNames,
    entry: &TypeEntry,
    tag: &Literal,
    mask: &TokenStream,
) -> FieldParts {
    let FieldNames {
        getter,
        slot,
        set,
        has,
        reset,
        declared,
    } = names;
    let rust_type = &entry.rust_type;
    let encode_fn = &entry.encode_fn;
    let decode_fn = &entry.decode_fn;
    let len_fn = &entry.len_fn;
    let wire = entry.wire.tokens();

    let (getter_ty, getter_expr, value_expr) = match entry.mode {
        ValueMode::Copy => (quote!(#rust_type), quote!(self.#slot), quote!(self.#slot)),
        ValueMode::Str => (
            quote!(&str),
            quote!(self.#slot.as_str()),
            quote!(self.#slot.as_str()),
        ),
        ValueMode::Slice => (
            quote!(&[u8]),
            quote!(self.#slot.as_slice()),
            quote!(self.#slot.as_slice()),
        ),
    };

    let (set_param, set_assign) = match entry.mode {
        ValueMode::Copy => (quote!(value: #rust_type), quote!(self.#slot = value;)),
        ValueMode::Str | ValueMode::Slice => (
            quote!(value: impl ::core::convert::Into<#rust_type>),
            quote!(self.#slot = value.into();),
        ),
    };

    let accessors = quote! {
        pub fn #getter(&self) -> ::core::result::Result<#getter_ty, ::protolith::PresenceError> {
            if (self.presence & #mask) != 0 {
                Ok(#getter_expr)
            } else {
                Err(::protolith::PresenceError::new(#declared))
            }
        }
        pub fn #set(&mut self, #set_param) {
            #set_assign
            self.presence |= #mask;
        }
        pub fn #has(&self) -> bool {
            (self.presence & #mask) != 0
        }
        pub fn #reset(&mut self) {
            self.presence &= !#mask;
            self.#slot = ::core::default::Default::default();
        }
    };

    FieldParts {
        slot: quote!(#slot: #rust_type,),
        accessors,
        encode: quote! {
            if (self.presence & #mask) != 0 {
                ::protolith::wire::encode_key(#wire, #tag, buf);
                #encode_fn(#value_expr, buf);
            }
        },
        len: quote! {
            if (self.presence & #mask) != 0 {
                len += ::protolith::wire::encoded_key_len(#tag);
                len += #len_fn(#value_expr);
            }
        },
        decode_arm: quote! {
            #tag => {
                msg.#set(#decode_fn(buf)?);
            }
        },
        init_rules: init_dispatch_rules(declared, |value| quote!($msg.#set(#value))),
    }
}

fn repeated_entry_field(
    names: &FieldNames,
    entry: &TypeEntry,
    tag: &Literal,
    mask: &TokenStream,
) -> FieldParts {
    let FieldNames {
        slot,
        set,
        declared,
        ..
    } = names;
    let rust_type = &entry.rust_type;
    let encode_fn = &entry.encode_fn;
    let decode_fn = &entry.decode_fn;
    let len_fn = &entry.len_fn;
    let wire = entry.wire.tokens();

    let iter_expr = match entry.mode {
        ValueMode::Copy => quote!(*value),
        ValueMode::Str => quote!(value.as_str()),
        ValueMode::Slice => quote!(value.as_slice()),
    };

    let accessors = repeated_accessors(names, &quote!(#rust_type), mask);

    // Scalars on the varint and fixed wires pack into one length-delimited
    // payload; length-delimited elements each carry their own key.
    let (encode, len) = if entry.wire.packable() {
        (
            quote! {
                if (self.presence & #mask) != 0 && !self.#slot.is_empty() {
                    ::protolith::wire::encode_key(::protolith::wire::WireType::Len, #tag, buf);
                    let mut payload_len = 0usize;
                    for value in &self.#slot {
                        payload_len += #len_fn(#iter_expr);
                    }
                    ::protolith::wire::encode_len(payload_len, buf);
                    for value in &self.#slot {
                        #encode_fn(#iter_expr, buf);
                    }
                }
            },
            quote! {
                if (self.presence & #mask) != 0 && !self.#slot.is_empty() {
                    let mut payload_len = 0usize;
                    for value in &self.#slot {
                        payload_len += #len_fn(#iter_expr);
                    }
                    len += ::protolith::wire::encoded_key_len(#tag);
                    len += ::protolith::wire::encoded_len_varint(payload_len as u64);
                    len += payload_len;
                }
            },
        )
    } else {
        (
            quote! {
                if (self.presence & #mask) != 0 {
                    for value in &self.#slot {
                        ::protolith::wire::encode_key(#wire, #tag, buf);
                        #encode_fn(#iter_expr, buf);
                    }
                }
            },
            quote! {
                if (self.presence & #mask) != 0 {
                    for value in &self.#slot {
                        len += ::protolith::wire::encoded_key_len(#tag);
                        len += #len_fn(#iter_expr);
                    }
                }
            },
        )
    };

    // Both the packed and the one-key-per-element layouts are accepted on
    // read, regardless of how this field would be written.
    let decode_arm = if entry.wire.packable() {
        quote! {
            #tag => {
                if wire_type == ::protolith::wire::WireType::Len {
                    let payload_len = ::protolith::wire::decode_len(buf)?;
                    if buf.remaining() < payload_len {
                        return Err(::protolith::DecodeError::UnexpectedEndOfBuffer);
                    }
                    let end = buf.remaining() - payload_len;
                    while buf.remaining() > end {
                        msg.#slot.push(#decode_fn(buf)?);
                    }
                    if buf.remaining() != end {
                        return Err(::protolith::DecodeError::InvalidPackedLength);
                    }
                } else {
                    msg.#slot.push(#decode_fn(buf)?);
                }
                msg.presence |= #mask;
            }
        }
    } else {
        quote! {
            #tag => {
                msg.#slot.push(#decode_fn(buf)?);
                msg.presence |= #mask;
            }
        }
    };

    FieldParts {
        slot: quote!(#slot: ::protolith::alloc::vec::Vec<#rust_type>,),
        accessors,
        encode,
        len,
        decode_arm,
        init_rules: init_dispatch_rules(declared, |value| quote!($msg.#set(#value))),
    }
}

fn singular_message_field(
    names: &FieldNames,
    inner: &proc_macro2::Ident,
    tag: &Literal,
    mask: &TokenStream,
    boxed: bool,
) -> FieldParts {
    let FieldNames {
        getter,
        slot,
        set,
        has,
        reset,
        declared,
    } = names;

    if boxed {
        // Cycle-breaking slots hold `Option<Box<T>>`: `None` neither
        // allocates nor recurses through `T::default()`, so a
        // self-referential record still has a terminating `Default`. The
        // presence bitset stays the public signal; the `Option` is layout
        // only, and the box is allocated in the setter.
        let accessors = quote! {
            pub fn #getter(&self) -> ::core::result::Result<&#inner, ::protolith::PresenceError> {
                if (self.presence & #mask) != 0 {
                    if let ::core::option::Option::Some(value) = &self.#slot {
                        return Ok(&**value);
                    }
                }
                Err(::protolith::PresenceError::new(#declared))
            }
            pub fn #set(&mut self, value: #inner) {
                self.#slot = ::core::option::Option::Some(
                    ::protolith::alloc::boxed::Box::new(value),
                );
                self.presence |= #mask;
            }
            pub fn #has(&self) -> bool {
                (self.presence & #mask) != 0
            }
            pub fn #reset(&mut self) {
                self.presence &= !#mask;
                self.#slot = ::core::option::Option::None;
            }
        };

        return FieldParts {
            slot: quote! {
                #slot: ::core::option::Option<::protolith::alloc::boxed::Box<#inner>>,
            },
            accessors,
            encode: quote! {
                if (self.presence & #mask) != 0 {
                    if let ::core::option::Option::Some(value) = &self.#slot {
                        ::protolith::wire::encode_key(::protolith::wire::WireType::Len, #tag, buf);
                        ::protolith::encode_message_field(&**value, buf);
                    }
                }
            },
            len: quote! {
                if (self.presence & #mask) != 0 {
                    if let ::core::option::Option::Some(value) = &self.#slot {
                        len += ::protolith::wire::encoded_key_len(#tag);
                        len += ::protolith::encoded_message_field_len(&**value);
                    }
                }
            },
            decode_arm: quote! {
                #tag => {
                    msg.#set(::protolith::decode_message_field(buf)?);
                }
            },
            init_rules: init_dispatch_rules(declared, |value| quote!($msg.#set(#value))),
        };
    }

    let accessors = quote! {
        pub fn #getter(&self) -> ::core::result::Result<&#inner, ::protolith::PresenceError> {
            if (self.presence & #mask) != 0 {
                Ok(&self.#slot)
            } else {
                Err(::protolith::PresenceError::new(#declared))
            }
        }
        pub fn #set(&mut self, value: #inner) {
            self.#slot = value;
            self.presence |= #mask;
        }
        pub fn #has(&self) -> bool {
            (self.presence & #mask) != 0
        }
        pub fn #reset(&mut self) {
            self.presence &= !#mask;
            self.#slot = ::core::default::Default::default();
        }
    };

    FieldParts {
        slot: quote!(#slot: #inner,),
        accessors,
        encode: quote! {
            if (self.presence & #mask) != 0 {
                ::protolith::wire::encode_key(::protolith::wire::WireType::Len, #tag, buf);
                ::protolith::encode_message_field(&self.#slot, buf);
            }
        },
        len: quote! {
            if (self.presence & #mask) != 0 {
                len += ::protolith::wire::encoded_key_len(#tag);
                len += ::protolith::encoded_message_field_len(&self.#slot);
            }
        },
        decode_arm: quote! {
            #tag => {
                msg.#set(::protolith::decode_message_field(buf)?);
            }
        },
        init_rules: init_dispatch_rules(declared, |value| quote!($msg.#set(#value))),
    }
}

fn repeated_message_field(
    names: &FieldNames,
    inner: &proc_macro2::Ident,
    tag: &Literal,
    mask: &TokenStream,
) -> FieldParts {
    let FieldNames {
        slot,
        set,
        declared,
        ..
    } = names;

    let accessors = repeated_accessors(names, &quote!(#inner), mask);

    FieldParts {
        slot: quote!(#slot: ::protolith::alloc::vec::Vec<#inner>,),
        accessors,
        encode: quote! {
            if (self.presence & #mask) != 0 {
                for value in &self.#slot {
                    ::protolith::wire::encode_key(::protolith::wire::WireType::Len, #tag, buf);
                    ::protolith::encode_message_field(value, buf);
                }
            }
        },
        len: quote! {
            if (self.presence & #mask) != 0 {
                for value in &self.#slot {
                    len += ::protolith::wire::encoded_key_len(#tag);
                    len += ::protolith::encoded_message_field_len(value);
                }
            }
        },
        decode_arm: quote! {
            #tag => {
                msg.#slot.push(::protolith::decode_message_field(buf)?);
                msg.presence |= #mask;
            }
        },
        init_rules: init_dispatch_rules(declared, |value| quote!($msg.#set(#value))),
    }
}

fn repeated_accessors(
    names: &FieldNames,
    element_ty: &TokenStream,
    mask: &TokenStream,
) -> TokenStream {
    let FieldNames {
        getter,
        slot,
        set,
        has,
        reset,
        declared,
    } = names;
    quote! {
        pub fn #getter(&self) -> ::core::result::Result<&[#element_ty], ::protolith::PresenceError> {
            if (self.presence & #mask) != 0 {
                Ok(self.#slot.as_slice())
            } else {
                Err(::protolith::PresenceError::new(#declared))
            }
        }
        pub fn #set(&mut self, value: impl ::core::convert::Into<::protolith::alloc::vec::Vec<#element_ty>>) {
            self.#slot = value.into();
            self.presence |= #mask;
        }
        pub fn #has(&self) -> bool {
            (self.presence & #mask) != 0
        }
        pub fn #reset(&mut self) {
            self.presence &= !#mask;
            self.#slot.clear();
        }
    }
}
