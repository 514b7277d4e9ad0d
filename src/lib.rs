//! Treeb - Flatten selected files and directories into one text document

pub mod exclusion;
pub mod file_utils;
pub mod flatten;
pub mod listing;
pub mod output;
pub mod presets;
pub mod selection;
pub mod tokens;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use exclusion::{ExclusionKind, ExclusionRuleSet, ExclusionVerdict, RulesHandle, classify};
pub use file_utils::{BinaryPolicy, read_text_file};
pub use flatten::{FlattenConfig, FlattenRequest, FlattenResult, Flattener};
pub use listing::{ListingNode, list_directory};
pub use output::{ContentAssembler, TreeRenderer, format_summary, print_json, print_summary};
pub use presets::{PresetError, PresetStore, PresetSummary};
pub use selection::{FsEntry, IncludedSet, SelectionExpander};
pub use tokens::{ModelWindow, TextTokenizer, TiktokenTokenizer, default_models};
