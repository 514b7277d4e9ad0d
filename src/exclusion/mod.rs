//! Exclusion rules and verdicts
//!
//! This module decides which filesystem entries never reach a flattened
//! document:
//!
//! - `ExclusionRuleSet`: directory names, file names and compiled glob patterns
//! - `classify`: the verdict for a single entry, reusable outside traversal
//! - `RulesHandle`: a shared rule set that can be swapped as a whole

mod classify;
mod handle;
mod rules;

pub use classify::{ExclusionKind, ExclusionVerdict, classify};
pub use handle::RulesHandle;
pub use rules::{
    DEFAULT_DIRS, DEFAULT_FILES, DEFAULT_PATTERNS, ExclusionRuleSet, NamePattern, RuleFile,
    RulesError,
};
