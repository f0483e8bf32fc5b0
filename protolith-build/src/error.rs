//! Error types for protolith-build.

use std::io;

/// Errors raised while compiling a proto3 schema.
///
/// Parse and validation errors are fatal to the build: no partial artifact
/// is ever emitted.
#[derive(Debug)]
pub enum Error {
    /// IO error reading a schema or writing the artifact.
    Io(io::Error),
    /// Neither `out_dir` nor the `OUT_DIR` environment variable is set.
    MissingOutDir,
    /// Malformed or unsupported schema text.
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    /// Two input files declare the same package.
    DuplicatePackage { package: String },
    /// Two types share a fully-qualified name.
    DuplicateType { name: String },
    /// Two fields of one message share a name.
    DuplicateFieldName { message: String, field: String },
    /// Two fields of one message share a number.
    DuplicateFieldNumber { message: String, number: u32 },
    /// A field reuses a reserved name.
    ReservedName { message: String, field: String },
    /// A field reuses a reserved number.
    ReservedNumber { message: String, number: u32 },
    /// A field references a type that is not in the gathered type set.
    UnresolvedType { reference: String, scope: String },
    /// A proto3 enum is missing its mandatory zero value.
    MissingZeroValue { name: String },
    /// A message declares more direct fields than the presence bitset holds.
    TooManyFields { message: String, count: usize },
    /// The generated artifact failed to re-parse (a generator bug).
    SynParse(String),
    /// The configured visibility is not valid Rust.
    InvalidVisibility(String),
}

impl Error {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::MissingOutDir => {
                write!(f, "OUT_DIR not set. Run from build.rs or set out_dir().")
            }
            Self::Parse {
                line,
                column,
                message,
            } => write!(f, "parse error at {line}:{column}: {message}"),
            Self::DuplicatePackage { package } => {
                write!(f, "package `{package}` declared more than once")
            }
            Self::DuplicateType { name } => write!(f, "type `{name}` declared more than once"),
            Self::DuplicateFieldName { message, field } => {
                write!(f, "message `{message}` declares field `{field}` twice")
            }
            Self::DuplicateFieldNumber { message, number } => {
                write!(f, "message `{message}` uses field number {number} twice")
            }
            Self::ReservedName { message, field } => {
                write!(f, "field `{field}` of `{message}` reuses a reserved name")
            }
            Self::ReservedNumber { message, number } => {
                write!(
                    f,
                    "field number {number} of `{message}` falls in a reserved range"
                )
            }
            Self::UnresolvedType { reference, scope } => {
                write!(f, "type `{reference}` not recognized inside `{scope}`")
            }
            Self::MissingZeroValue { name } => {
                write!(f, "enum `{name}` must declare a value for 0 (proto3)")
            }
            Self::TooManyFields { message, count } => {
                write!(
                    f,
                    "message `{message}` declares {count} direct fields, more than the presence bitset supports (128)"
                )
            }
            Self::SynParse(msg) => write!(f, "failed to parse generated code: {}", msg),
            Self::InvalidVisibility(vis) => {
                write!(f, "`{vis}` is not a valid visibility")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
