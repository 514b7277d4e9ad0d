//! The flatten pipeline
//!
//! `Flattener` ties the pieces together: expand the selection, render the
//! structure header, assemble file contents and estimate the token budget.
//! Every call works on its own state and a snapshot of the rules, so one
//! `Flattener` can serve concurrent requests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::exclusion::RulesHandle;
use crate::file_utils::BinaryPolicy;
use crate::output::{ContentAssembler, TreeRenderer};
use crate::selection::{IncludedSet, SelectionExpander};
use crate::tokens::{ModelPercentage, ModelWindow, TextTokenizer, default_models, estimate};

/// Text returned when nothing survives exclusion.
pub const NOTHING_SELECTED: &str = "No files selected or all selected items are excluded.";

/// Body used when the selection has entries but no readable files.
pub const NO_CONTENT_FILES: &str = "No files selected/accessible (after exclusion).\n";

const CONTENT_HEADING: &str = "Content of selected files:\n";

/// Configuration for flattening behavior.
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    pub binary_policy: BinaryPolicy,
    /// Context windows to report usage against, in display order
    pub models: Vec<ModelWindow>,
    /// Directory relative selections are resolved against (current dir if unset)
    pub base_dir: Option<PathBuf>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            binary_policy: BinaryPolicy::default(),
            models: default_models(),
            base_dir: None,
        }
    }
}

/// Incoming request shape: `{ "paths": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlattenRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Counts describing what went into a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    pub directories: usize,
    pub files: usize,
    pub excluded: usize,
    pub missing: usize,
}

impl SelectionSummary {
    fn of(set: &IncludedSet) -> Self {
        let files = set.content_files().len();
        Self {
            directories: set.structure_entries().len() - files,
            files,
            excluded: set.excluded().len(),
            missing: set.missing().len(),
        }
    }
}

/// The flattened document and its token statistics.
#[derive(Debug, Clone, Serialize)]
pub struct FlattenResult {
    pub text: String,
    pub token_count: i64,
    pub model_percentages: Vec<ModelPercentage>,
    #[serde(skip)]
    pub summary: SelectionSummary,
}

pub struct Flattener {
    rules: RulesHandle,
    tokenizer: Option<Box<dyn TextTokenizer>>,
    config: FlattenConfig,
}

impl Flattener {
    pub fn new(rules: RulesHandle, config: FlattenConfig) -> Self {
        Self {
            rules,
            tokenizer: None,
            config,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: impl TextTokenizer + 'static) -> Self {
        self.tokenizer = Some(Box::new(tokenizer));
        self
    }

    pub fn rules(&self) -> &RulesHandle {
        &self.rules
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    pub fn flatten_request(&self, request: &FlattenRequest) -> FlattenResult {
        self.flatten(&request.paths)
    }

    /// Flatten `raw_paths` into one document.
    ///
    /// Never fails: missing inputs are skipped, unreadable files become
    /// markers and tokenizer problems show up in the statistics.
    pub fn flatten<S: AsRef<str>>(&self, raw_paths: &[S]) -> FlattenResult {
        let rules = self.rules.current();
        let mut expander = SelectionExpander::new(&rules);
        if let Some(base) = &self.config.base_dir {
            expander = expander.with_base_dir(base);
        }
        let set = expander.expand(raw_paths);

        let text = if set.is_empty() {
            NOTHING_SELECTED.to_string()
        } else {
            self.document(&set)
        };

        let estimate = estimate(&text, self.tokenizer.as_deref(), &self.config.models);
        FlattenResult {
            text,
            token_count: estimate.token_count,
            model_percentages: estimate.per_model,
            summary: SelectionSummary::of(&set),
        }
    }

    fn document(&self, set: &IncludedSet) -> String {
        let mut renderer = TreeRenderer::new();
        if let Some(base) = &self.config.base_dir {
            renderer = renderer.with_fallback_dir(base);
        }
        let rendered = renderer.render(set.structure_entries());

        let mut text = rendered.header();
        text.push_str(CONTENT_HEADING);
        if set.content_files().is_empty() {
            text.push_str(NO_CONTENT_FILES);
        } else {
            let assembler = ContentAssembler::new(self.config.binary_policy);
            text.push_str(&assembler.assemble(set.content_files(), &rendered.common_ancestor));
        }
        text
    }
}
