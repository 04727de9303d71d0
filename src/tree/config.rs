//! Configuration for building and filtering trees

use std::time::SystemTime;

use super::filter::{Predicate, extension_predicate, ignore_predicate, modified_predicate};
use crate::error::Result;

/// Configuration for tree building behavior.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Deepest level still included; the root is depth 0. `None` = unlimited.
    pub max_depth: Option<usize>,
    /// Drop files that do not classify as text.
    pub text_only: bool,
    /// Accepted file extensions, case-insensitive. Empty accepts all.
    pub extensions: Vec<String>,
    /// File name globs to leave out.
    pub ignore_patterns: Vec<String>,
    /// Only include files modified after this time
    pub newer_than: Option<SystemTime>,
    /// Only include files modified before this time
    pub older_than: Option<SystemTime>,
    /// Number of parallel workers for the map stage.
    /// 0 = auto-detect (use all available cores)
    /// 1 = sequential (no parallelism)
    /// N = use N worker threads
    pub parallel_workers: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            text_only: true,
            extensions: Vec::new(),
            ignore_patterns: Vec::new(),
            newer_than: None,
            older_than: None,
            parallel_workers: 1,
        }
    }
}

impl WalkerConfig {
    /// Predicates implied by the option fields, in evaluation order.
    pub fn predicates(&self) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::new();
        if !self.ignore_patterns.is_empty() {
            predicates.push(ignore_predicate(&self.ignore_patterns)?);
        }
        if !self.extensions.is_empty() {
            predicates.push(extension_predicate(&self.extensions));
        }
        if self.newer_than.is_some() || self.older_than.is_some() {
            predicates.push(modified_predicate(self.newer_than, self.older_than));
        }
        Ok(predicates)
    }
}
