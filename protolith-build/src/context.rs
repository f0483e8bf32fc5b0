//! Generation context and identifier folding.

use std::collections::HashSet;

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, ToTokens};

use crate::ast::ProtoDef;
use crate::codegen::recursion::{find_recursive_fields, RecursiveField};
use crate::codegen::types::TypeTable;
use crate::config::Config;
use crate::error::Error;
use crate::resolver::TypeSet;

/// Context threaded through code generation: the type mapping table, the
/// fields that must be boxed to break reference cycles, and the configured
/// item visibility.
pub struct GenerationContext {
    pub table: TypeTable,
    pub vis: TokenStream,
    recursive_fields: HashSet<RecursiveField>,
}

impl GenerationContext {
    pub fn new(def: &ProtoDef, types: &TypeSet, config: &Config) -> Result<Self, Error> {
        let vis = syn::parse_str::<syn::Visibility>(&config.visibility)
            .map_err(|_| Error::InvalidVisibility(config.visibility.clone()))?
            .into_token_stream();
        Ok(Self {
            table: TypeTable::new(types),
            vis,
            recursive_fields: find_recursive_fields(def),
        })
    }

    /// Check if a field sits on a message-reference cycle and needs `Box`.
    pub fn is_boxed(&self, message_fqn: &str, field_name: &str) -> bool {
        self.recursive_fields.contains(&RecursiveField {
            message_fqn: message_fqn.to_string(),
            field_name: field_name.to_string(),
        })
    }
}

/// Flatten a fully-qualified dotted name into a single identifier:
/// `pkg.Outer.Inner` becomes `pkg_Outer_Inner`.
pub fn flat_ident(fqn: &str) -> Ident {
    format_ident!("{}", fqn.replace('.', "_"))
}

/// Make an identifier from a name, raw-escaping Rust keywords.
pub fn ident(name: &str) -> Ident {
    if let Some(stripped) = name.strip_prefix("r#") {
        Ident::new_raw(stripped, Span::call_site())
    } else if matches!(name, "self" | "Self" | "super" | "crate") {
        // These four cannot be raw identifiers.
        Ident::new(&format!("{name}_"), Span::call_site())
    } else if is_rust_keyword(name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}

/// Convert a proto field name to its canonical Rust spelling (snake_case,
/// keyword-escaped).
pub fn to_rust_field_name(name: &str) -> String {
    let snake = to_snake_case(name);
    if matches!(snake.as_str(), "self" | "Self" | "super" | "crate") {
        // These four cannot be raw identifiers.
        format!("{}_", snake)
    } else if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Convert a string to snake_case.
///
/// Handles consecutive uppercase letters:
/// - "HTTPServer" -> "http_server"
/// - "myField" -> "my_field"
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev_lower = chars[i - 1].is_lowercase();
                let prev_upper = chars[i - 1].is_uppercase();
                let next_lower = chars.get(i + 1).map(|c| c.is_lowercase()).unwrap_or(false);
                if prev_lower || (prev_upper && next_lower) {
                    result.push('_');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Convert snake_case or SCREAMING_SNAKE_CASE to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.map(|c| c.to_ascii_lowercase()))
                    .collect(),
            }
        })
        .collect()
}

/// Check if a string is a Rust keyword.
fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
            | "try"
    )
}
