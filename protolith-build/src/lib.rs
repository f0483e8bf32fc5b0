//! `protolith-build` compiles proto3 schemas into Rust code for use with
//! the protolith runtime, with no external code generator: schema parsing,
//! semantic validation, and code emission all happen inside the build of
//! the consuming program.
//!
//! # Example
//!
//! ```rust,no_run
//! // In build.rs
//! fn main() -> Result<(), protolith_build::Error> {
//!     protolith_build::compile_protos(&["proto/messages.proto"])?;
//!     Ok(())
//! }
//! ```
//!
//! The generated file lands in `OUT_DIR` for the usual
//! `include!(concat!(env!("OUT_DIR"), "/protos.rs"))`.
//!
//! # Advanced usage
//!
//! ```rust,no_run
//! fn main() -> Result<(), protolith_build::Error> {
//!     protolith_build::Config::new()
//!         .out_dir("src/proto")
//!         .visibility("pub(crate)")
//!         .compile_protos(&["proto/messages.proto"])?;
//!     Ok(())
//! }
//! ```
//!
//! The [`proto!`](https://docs.rs/protolith) and `proto_file!` macros in
//! `protolith-macros` drive the same pipeline from inside a source file.

pub mod ast;
mod codegen;
mod config;
mod context;
mod error;
pub mod parser;
pub mod resolver;

pub use config::Config;
pub use error::Error;

use std::path::Path;

use proc_macro2::TokenStream;

/// Compile a literal schema text into the generated artifact.
pub fn generate_from_str(source: &str) -> Result<TokenStream, Error> {
    Config::new().generate_from_str(source)
}

/// Compile the schema at `path` into the generated artifact.
pub fn generate_from_file(path: impl AsRef<Path>) -> Result<TokenStream, Error> {
    Config::new().generate_from_file(path)
}

/// Compile `.proto` files with default settings, writing the artifact into
/// `OUT_DIR`.
pub fn compile_protos(protos: &[impl AsRef<Path>]) -> Result<(), Error> {
    Config::new().compile_protos(protos)
}

/// Render an artifact through prettyplease for dumps and written files.
pub(crate) fn render(tokens: &TokenStream) -> Result<String, Error> {
    let file = syn::parse2::<syn::File>(tokens.clone()).map_err(|e| Error::SynParse(e.to_string()))?;
    Ok(prettyplease::unparse(&file))
}
