//! Semantic resolution over the parsed schema tree.
//!
//! Two passes: gather every fully-qualified type name, then rewrite each
//! field's type reference to its fully-qualified form using proto scoping
//! rules. Afterwards every message and enum carries its own FQN and the
//! duplicate/reserved checks run over the flattened field lists.

use std::collections::{HashMap, HashSet};

use crate::ast::{join_name, FieldType, Message, MessageItem, ProtoDef};
use crate::error::Error;

/// Whether a gathered type is a message or an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

/// The set of fully-qualified type names gathered from a [`ProtoDef`].
#[derive(Debug, Default)]
pub struct TypeSet {
    types: HashMap<String, TypeKind>,
}

impl TypeSet {
    pub fn contains(&self, fqn: &str) -> bool {
        self.types.contains_key(fqn)
    }

    pub fn kind(&self, fqn: &str) -> Option<TypeKind> {
        self.types.get(fqn).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, TypeKind)> {
        self.types.iter().map(|(fqn, kind)| (fqn, *kind))
    }

    fn insert(&mut self, fqn: String, kind: TypeKind) -> Result<(), Error> {
        if self.types.insert(fqn.clone(), kind).is_some() {
            return Err(Error::DuplicateType { name: fqn });
        }
        Ok(())
    }
}

/// Resolve `def` in place and return the gathered type set.
///
/// On success every field's proto type is either a scalar or an FQN present
/// in the returned set, and every message/enum name has been rewritten to
/// its FQN.
pub fn resolve(def: &mut ProtoDef) -> Result<TypeSet, Error> {
    let mut package_names = HashSet::new();
    for package in &def.packages {
        if !package_names.insert(package.name.clone()) {
            return Err(Error::DuplicatePackage {
                package: package.name.clone(),
            });
        }
    }

    // Pass 1: gather the type set.
    let mut types = TypeSet::default();
    for package in &def.packages {
        for message in &package.messages {
            gather_message(&mut types, &package.name, message)?;
        }
        for decl in &package.enums {
            types.insert(join_name(&package.name, &decl.name), TypeKind::Enum)?;
        }
    }

    // Pass 2: resolve references and rewrite names to FQNs.
    for package in &mut def.packages {
        let mut scopes = Vec::new();
        if !package.name.is_empty() {
            scopes.push(package.name.clone());
        }
        for message in &mut package.messages {
            resolve_message(&types, &mut scopes, message)?;
        }
        for decl in &mut package.enums {
            decl.name = join_name(&package.name, &decl.name);
        }
    }

    // Duplicate and reserved enforcement over the resolved tree.
    for package in &def.packages {
        for message in &package.messages {
            enforce_message(message)?;
        }
    }

    Ok(types)
}

fn gather_message(types: &mut TypeSet, scope: &str, message: &Message) -> Result<(), Error> {
    let fqn = join_name(scope, &message.name);
    types.insert(fqn.clone(), TypeKind::Message)?;
    for decl in &message.enums {
        types.insert(join_name(&fqn, &decl.name), TypeKind::Enum)?;
    }
    for nested in &message.messages {
        gather_message(types, &fqn, nested)?;
    }
    Ok(())
}

fn resolve_message(
    types: &TypeSet,
    scopes: &mut Vec<String>,
    message: &mut Message,
) -> Result<(), Error> {
    let outer = scopes.last().map(String::as_str).unwrap_or("");
    let fqn = join_name(outer, &message.name);

    scopes.push(fqn.clone());
    for item in &mut message.items {
        let fields = match item {
            MessageItem::Field(field) => std::slice::from_mut(field),
            MessageItem::Oneof(oneof) => oneof.fields.as_mut_slice(),
        };
        for field in fields {
            if let FieldType::Named(reference) = &mut field.ty {
                *reference = resolve_reference(types, scopes, reference, &fqn)?;
            }
        }
    }
    for decl in &mut message.enums {
        decl.name = join_name(&fqn, &decl.name);
    }
    for nested in &mut message.messages {
        resolve_message(types, scopes, nested)?;
    }
    scopes.pop();

    message.name = fqn;
    Ok(())
}

/// Resolve one type reference against the scope chain.
///
/// `scopes` is ordered outermost to innermost. A leading dot marks an
/// absolute reference: it is tried verbatim first, then with enclosing
/// scopes prepended from the outermost inward. A relative reference searches
/// the enclosing scopes from the innermost outward, then falls back to the
/// bare name.
fn resolve_reference(
    types: &TypeSet,
    scopes: &[String],
    reference: &str,
    containing_scope: &str,
) -> Result<String, Error> {
    if let Some(bare) = reference.strip_prefix('.') {
        if types.contains(bare) {
            return Ok(bare.to_string());
        }
        for prefix in scopes {
            let candidate = format!("{prefix}.{bare}");
            if types.contains(&candidate) {
                return Ok(candidate);
            }
        }
    } else {
        for prefix in scopes.iter().rev() {
            let candidate = format!("{prefix}.{reference}");
            if types.contains(&candidate) {
                return Ok(candidate);
            }
        }
        if types.contains(reference) {
            return Ok(reference.to_string());
        }
    }

    Err(Error::UnresolvedType {
        reference: reference.to_string(),
        scope: containing_scope.to_string(),
    })
}

fn enforce_message(message: &Message) -> Result<(), Error> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();

    // Oneof group names share the accessor namespace with field names.
    for item in &message.items {
        if let MessageItem::Oneof(oneof) = item {
            if !names.insert(oneof.name.as_str()) {
                return Err(Error::DuplicateFieldName {
                    message: message.name.clone(),
                    field: oneof.name.clone(),
                });
            }
        }
    }

    for field in message.flattened_fields() {
        if !names.insert(field.name.as_str()) {
            return Err(Error::DuplicateFieldName {
                message: message.name.clone(),
                field: field.name.clone(),
            });
        }
        if !numbers.insert(field.number) {
            return Err(Error::DuplicateFieldNumber {
                message: message.name.clone(),
                number: field.number,
            });
        }
        for reserved in &message.reserved {
            if reserved.covers_name(&field.name) {
                return Err(Error::ReservedName {
                    message: message.name.clone(),
                    field: field.name.clone(),
                });
            }
            if reserved.covers_number(field.number) {
                return Err(Error::ReservedNumber {
                    message: message.name.clone(),
                    number: field.number,
                });
            }
        }
    }

    for nested in &message.messages {
        enforce_message(nested)?;
    }
    Ok(())
}
