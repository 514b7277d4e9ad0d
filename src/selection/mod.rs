//! Selection expansion
//!
//! Raw path strings from the user are resolved into `FsEntry` values and
//! expanded into an `IncludedSet` by `SelectionExpander`.

mod entry;
mod expander;

pub use entry::{EntryKind, FsEntry, ListError, list_children};
pub use expander::{IncludedSet, SelectionExpander};
