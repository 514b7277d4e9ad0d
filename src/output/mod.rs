//! Document rendering and display
//!
//! # Module Structure
//!
//! - `tree` - Structure header: common ancestor and ASCII tree
//! - `content` - Labeled file content blocks
//! - `summary` - Token budget summary and JSON output

mod content;
mod summary;
mod tree;

pub use content::{BINARY_MARKER, ContentAssembler, display_path};
pub use summary::{format_summary, print_json, print_summary};
pub use tree::{NameTree, RenderedTree, TreeRenderer};
