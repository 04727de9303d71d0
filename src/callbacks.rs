//! Named callbacks for the filter, map and reduce stages
//!
//! Callbacks are plain Rust functions registered under a stable name. The
//! command line refers to them by that name; resolution happens before any
//! tree is built or read, so a typo fails fast.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use crate::error::{CallbackKind, Error, Result};
use crate::tree::{Annotation, FileNode, Mapper, NodePatch, Predicate, Reducer};

/// Name-keyed lookup of predicates, mappers and reducers.
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    predicates: BTreeMap<String, Predicate>,
    mappers: BTreeMap<String, Mapper>,
    reducers: BTreeMap<String, Reducer>,
}

impl CallbackRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the callbacks shipped with treeverse.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_predicate("non_empty", non_empty);
        registry.register_predicate("visible", visible);
        registry.register_mapper("line_count", line_count);
        registry.register_mapper("file_stats", file_stats);
        registry.register_reducer("total_lines", total_lines);
        registry.register_reducer("total_size", total_size);
        registry
    }

    /// Register a predicate, replacing any previous one of that name.
    pub fn register_predicate<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&FileNode) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(f));
    }

    pub fn register_mapper<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&FileNode) -> Annotation + Send + Sync + 'static,
    {
        self.mappers.insert(name.into(), Arc::new(f));
    }

    pub fn register_reducer<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&FileNode) -> NodePatch + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Arc::new(f));
    }

    pub fn predicate(&self, name: &str) -> Result<Predicate> {
        lookup(&self.predicates, CallbackKind::Predicate, name)
    }

    pub fn mapper(&self, name: &str) -> Result<Mapper> {
        lookup(&self.mappers, CallbackKind::Mapper, name)
    }

    pub fn reducer(&self, name: &str) -> Result<Reducer> {
        lookup(&self.reducers, CallbackKind::Reducer, name)
    }

    /// Resolve several predicates, failing on the first unknown name.
    pub fn predicates<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Predicate>> {
        names.iter().map(|n| self.predicate(n.as_ref())).collect()
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: CallbackKind) -> Vec<&str> {
        match kind {
            CallbackKind::Predicate => self.predicates.keys().map(String::as_str).collect(),
            CallbackKind::Mapper => self.mappers.keys().map(String::as_str).collect(),
            CallbackKind::Reducer => self.reducers.keys().map(String::as_str).collect(),
        }
    }
}

fn lookup<T: Clone>(table: &BTreeMap<String, T>, kind: CallbackKind, name: &str) -> Result<T> {
    table.get(name).cloned().ok_or_else(|| Error::CallbackResolution {
        kind,
        name: name.to_string(),
    })
}

/// Keep files with at least one byte.
pub fn non_empty(node: &FileNode) -> bool {
    node.file_info.size > 0
}

/// Keep files whose name does not start with a dot.
pub fn visible(node: &FileNode) -> bool {
    !node.name.starts_with('.')
}

/// `{"lines": n}` for text files, `{}` for everything else.
pub fn line_count(node: &FileNode) -> Annotation {
    match node.file_info.line_count() {
        Some(lines) => json!({ "lines": lines }),
        None => json!({}),
    }
}

/// Byte size plus the text counts when the file has them.
pub fn file_stats(node: &FileNode) -> Annotation {
    let mut stats = serde_json::Map::new();
    if node.is_file() {
        stats.insert("bytes".to_string(), json!(node.file_info.size));
    }
    if let Some(ref text) = node.file_info.text {
        stats.insert("lines".to_string(), json!(text.line_count));
        stats.insert("words".to_string(), json!(text.word_count));
        stats.insert("characters".to_string(), json!(text.character_count));
    }
    Annotation::Object(stats)
}

/// Own `lines` plus every child's `lines`.
pub fn total_lines(node: &FileNode) -> NodePatch {
    NodePatch::annotation(json!({ "lines": sum_field(node, "lines") }))
}

/// Own `bytes` plus every child's `bytes`.
pub fn total_size(node: &FileNode) -> NodePatch {
    NodePatch::annotation(json!({ "bytes": sum_field(node, "bytes") }))
}

fn sum_field(node: &FileNode, field: &str) -> u64 {
    let own = node.annotation[field].as_u64().unwrap_or(0);
    let children: u64 = node
        .children()
        .iter()
        .map(|c| c.annotation[field].as_u64().unwrap_or(0))
        .sum();
    own + children
}
