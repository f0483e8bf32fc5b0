//! Function-like macros for protolith.
//!
//! Provides `proto!` and `proto_file!`, the in-source entry points to the
//! schema compiler: the whole pipeline (parse, resolve, generate) runs at
//! macro expansion time and the generated types land in the surrounding
//! module.
//!
//! # Example
//!
//! ```ignore
//! protolith_macros::proto! {r#"
//!     syntax = "proto3";
//!     message Person {
//!         string name = 1;
//!         int32 id = 2;
//!     }
//! "#}
//!
//! let person = init_Person!(name = "ada", id = 7);
//! ```
//!
//! Set the `PROTOLITH_DUMP` environment variable to print the generated
//! artifact during the build.

use proc_macro::TokenStream;
use std::path::{Path, PathBuf};

/// Compile a literal proto3 schema text in place.
///
/// Expands to the full generated artifact: record types, `init_*` macros,
/// presence-aware accessors, and the encode/decode/length routines.
#[proc_macro]
pub fn proto(input: TokenStream) -> TokenStream {
    let lit = syn::parse_macro_input!(input as syn::LitStr);
    match protolith_build::generate_from_str(&lit.value()) {
        Ok(tokens) => tokens.into(),
        Err(err) => compile_error(lit.span(), &err.to_string()),
    }
}

/// Compile the proto3 schema at the given path, relative to the crate's
/// `CARGO_MANIFEST_DIR`.
#[proc_macro]
pub fn proto_file(input: TokenStream) -> TokenStream {
    let lit = syn::parse_macro_input!(input as syn::LitStr);
    let path = manifest_relative(&lit.value());
    match protolith_build::generate_from_file(&path) {
        Ok(tokens) => tokens.into(),
        Err(err) => compile_error(
            lit.span(),
            &format!("{}: {err}", path.display()),
        ),
    }
}

fn manifest_relative(path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::var_os("CARGO_MANIFEST_DIR") {
        Some(root) => Path::new(&root).join(path),
        None => path.to_path_buf(),
    }
}

fn compile_error(span: proc_macro2::Span, message: &str) -> TokenStream {
    syn::Error::new(span, message).to_compile_error().into()
}
