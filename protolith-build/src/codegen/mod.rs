//! Code generation from the resolved schema tree.
//!
//! Every message becomes a record with a presence bitset, presence-aware
//! accessors, an `init_*` constructor macro, and a `Message` impl carrying
//! the encode/decode/length triple. Types are flat-named from their FQN
//! with dots replaced by underscores, so nested declarations emit as
//! siblings.

mod enumeration;
mod field;
mod message;
mod oneof;
pub(crate) mod recursion;
pub(crate) mod types;

use proc_macro2::TokenStream;

use crate::ast::ProtoDef;
use crate::config::Config;
use crate::context::GenerationContext;
use crate::error::Error;
use crate::resolver::TypeSet;

/// Generate the full artifact for a resolved [`ProtoDef`].
pub fn generate(def: &ProtoDef, types: &TypeSet, config: &Config) -> Result<TokenStream, Error> {
    let ctx = GenerationContext::new(def, types, config)?;

    let mut tokens = TokenStream::new();
    for package in &def.packages {
        for decl in &package.enums {
            tokens.extend(enumeration::generate_enum(&ctx, decl)?);
        }
        for msg in &package.messages {
            tokens.extend(message::generate_message(&ctx, msg)?);
        }
    }
    Ok(tokens)
}
