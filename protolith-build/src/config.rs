//! Configuration for protobuf code generation.

use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;

use crate::ast::{Package, ProtoDef};
use crate::error::Error;
use crate::{codegen, parser, resolver};

/// Configuration for schema compilation.
///
/// The two generation entry points ([`Config::generate_from_str`] and
/// [`Config::generate_from_file`]) return the artifact as a token stream;
/// [`Config::compile_protos`] writes it to disk for `include!` consumers.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output directory for the generated file. Falls back to `OUT_DIR`.
    pub(crate) out_dir: Option<PathBuf>,

    /// Name of the generated file inside `out_dir`.
    pub(crate) out_file_name: String,

    /// Visibility applied to every generated item.
    pub(crate) visibility: String,

    /// Disable formatting with prettyplease.
    pub(crate) skip_format: bool,

    /// Print the rendered artifact to stderr for inspection.
    pub(crate) dump_generated: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: None,
            out_file_name: "protos.rs".to_string(),
            visibility: "pub".to_string(),
            skip_format: false,
            dump_generated: false,
        }
    }
}

impl Config {
    /// Create a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory for the generated Rust file.
    pub fn out_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.out_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the name of the generated file (default `protos.rs`).
    pub fn out_file_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.out_file_name = name.into();
        self
    }

    /// Set the visibility emitted on generated items (default `pub`).
    ///
    /// Re-exporting a generated message from another module is then a plain
    /// `pub use`; narrow this to `pub(crate)` or `pub(super)` to keep the
    /// artifact internal.
    pub fn visibility(&mut self, visibility: impl Into<String>) -> &mut Self {
        self.visibility = visibility.into();
        self
    }

    /// Skip formatting with prettyplease.
    pub fn skip_format(&mut self) -> &mut Self {
        self.skip_format = true;
        self
    }

    /// Print the rendered artifact to stderr.
    ///
    /// The `PROTOLITH_DUMP` environment variable enables the same switch
    /// without touching build scripts.
    pub fn dump_generated(&mut self, dump: bool) -> &mut Self {
        self.dump_generated = dump;
        self
    }

    /// Compile a literal schema text into the generated artifact.
    pub fn generate_from_str(&self, source: &str) -> Result<TokenStream, Error> {
        let package = parser::parse(source)?;
        self.generate(vec![package])
    }

    /// Compile the schema at `path` into the generated artifact.
    pub fn generate_from_file(&self, path: impl AsRef<Path>) -> Result<TokenStream, Error> {
        let source = std::fs::read_to_string(path)?;
        self.generate_from_str(&source)
    }

    /// Compile `.proto` files and write the artifact into the output
    /// directory, ready for `include!`.
    pub fn compile_protos(&self, protos: &[impl AsRef<Path>]) -> Result<(), Error> {
        let mut packages = Vec::new();
        for path in protos {
            let source = std::fs::read_to_string(path)?;
            packages.push(parser::parse(&source)?);
        }
        let tokens = self.generate(packages)?;

        let out_dir = self
            .out_dir
            .clone()
            .or_else(|| std::env::var_os("OUT_DIR").map(Into::into))
            .ok_or(Error::MissingOutDir)?;
        let content = if self.skip_format {
            tokens.to_string()
        } else {
            crate::render(&tokens)?
        };
        std::fs::write(out_dir.join(&self.out_file_name), content)?;
        Ok(())
    }

    fn generate(&self, packages: Vec<Package>) -> Result<TokenStream, Error> {
        let mut def = ProtoDef {
            packages: merge_packages(packages),
        };
        let types = resolver::resolve(&mut def)?;
        let tokens = codegen::generate(&def, &types, self)?;

        if self.dump_generated || std::env::var_os("PROTOLITH_DUMP").is_some() {
            eprintln!("{}", crate::render(&tokens)?);
        }

        Ok(tokens)
    }
}

/// Files sharing a package name contribute to one scope, the way protoc
/// treats a package split across files.
fn merge_packages(parsed: Vec<Package>) -> Vec<Package> {
    let mut merged: Vec<Package> = Vec::new();
    for package in parsed {
        match merged.iter_mut().find(|p| p.name == package.name) {
            Some(existing) => {
                existing.messages.extend(package.messages);
                existing.enums.extend(package.enums);
            }
            None => merged.push(package),
        }
    }
    merged
}
