//! Recursive type detection for automatic boxing.
//!
//! Messages can reference themselves, directly or through intermediaries:
//!
//! ```protobuf
//! message Node { Node child = 1; }
//!
//! message A { B b = 1; }
//! message B { A a = 1; }
//! ```
//!
//! A Rust record needs indirection to close such a cycle, so the fields
//! that complete one are marked here and the generator boxes their slots.
//! Repeated fields already live behind a `Vec` and never need marking.
//!
//! Runs on the resolved tree: message names and field references are FQNs.

use std::collections::{HashMap, HashSet};

use crate::ast::{FieldType, Message, ProtoDef};

/// A field that needs to be boxed to break a recursive cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecursiveField {
    /// Fully-qualified name of the containing message.
    pub message_fqn: String,
    /// Name of the field that needs boxing.
    pub field_name: String,
}

/// Analyze a resolved [`ProtoDef`] and return the fields that need boxing.
pub fn find_recursive_fields(def: &ProtoDef) -> HashSet<RecursiveField> {
    // Build the reference graph: message fqn -> (field name, target fqn).
    let mut graph: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for package in &def.packages {
        for message in &package.messages {
            collect_message_edges(&mut graph, message);
        }
    }

    let mut result = HashSet::new();
    for message_fqn in graph.keys() {
        find_cycles_from(&graph, message_fqn, &mut result);
    }
    result
}

fn collect_message_edges(graph: &mut HashMap<String, Vec<(String, String)>>, message: &Message) {
    let mut edges = Vec::new();
    for field in message.flattened_fields() {
        // A repeated slot is a Vec, which is already indirection.
        if field.repeated {
            continue;
        }
        if let FieldType::Named(target) = &field.ty {
            edges.push((field.name.clone(), target.clone()));
        }
    }
    graph.insert(message.name.clone(), edges);

    for nested in &message.messages {
        collect_message_edges(graph, nested);
    }
}

/// DFS from `start` marking fields whose edge closes a cycle back to it.
fn find_cycles_from(
    graph: &HashMap<String, Vec<(String, String)>>,
    start: &str,
    result: &mut HashSet<RecursiveField>,
) {
    let mut in_path = HashSet::new();
    in_path.insert(start.to_string());
    dfs_find_cycles(graph, start, start, &mut in_path, result);
}

fn dfs_find_cycles(
    graph: &HashMap<String, Vec<(String, String)>>,
    current: &str,
    target: &str,
    in_path: &mut HashSet<String>,
    result: &mut HashSet<RecursiveField>,
) {
    let Some(edges) = graph.get(current) else {
        // Enum references have no outgoing edges.
        return;
    };

    for (field_name, referenced_type) in edges {
        if referenced_type == target {
            result.insert(RecursiveField {
                message_fqn: current.to_string(),
                field_name: field_name.clone(),
            });
            continue;
        }

        if in_path.contains(referenced_type) {
            continue;
        }

        in_path.insert(referenced_type.clone());
        dfs_find_cycles(graph, referenced_type, target, in_path, result);
        in_path.remove(referenced_type);
    }
}
