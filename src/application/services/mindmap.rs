//! Mind-map service
//!
//! Loads input documents, builds the tree and renders it for output.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::config::OutputFormat;
use crate::domain::{
    DisplayFormat, InputDocument, Limits, MindMapBuilder, Node, TreeNodeConvert, UserInfo,
};
use crate::infrastructure::traits::FileSystem;

/// How a finished tree is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Tree format only: hide children of collapsed nodes.
    pub respect_collapse: bool,
}

/// A built tree together with its rendered text.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub root: Node,
    pub rendered: String,
}

/// Service turning record-bag documents into mind-map trees.
pub struct MindMapService {
    fs: Arc<dyn FileSystem>,
    format: Arc<dyn DisplayFormat>,
    limits: Limits,
}

impl MindMapService {
    pub fn new(fs: Arc<dyn FileSystem>, format: Arc<dyn DisplayFormat>, limits: Limits) -> Self {
        Self { fs, format, limits }
    }

    /// Read and decode an input document.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, input: &Path) -> ApplicationResult<InputDocument> {
        if !self.fs.is_file(input) {
            return Err(ApplicationError::InputNotFound(input.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(input)
            .with_path_context("read input", input)?;
        let document = InputDocument::parse(&content)?;
        debug!(
            records = document.bag.as_ref().map(|b| b.total_records()).unwrap_or(0),
            "loaded document"
        );
        Ok(document)
    }

    /// Build the tree. `identity` overrides the document's own user info field by field.
    pub fn build(&self, document: &InputDocument, identity: Option<&UserInfo>) -> Node {
        let user_info = match (&document.user_info, identity) {
            (Some(own), Some(given)) => Some(own.merged_with(given)),
            (None, Some(given)) => Some(given.clone()),
            (own, None) => own.clone(),
        };
        MindMapBuilder::new(self.format.as_ref())
            .with_limits(self.limits)
            .build(document.bag.as_ref(), user_info.as_ref())
    }

    pub fn render(&self, root: &Node, options: RenderOptions) -> ApplicationResult<String> {
        let rendered = match options.format {
            OutputFormat::Json => serde_json::to_string(root),
            OutputFormat::Pretty => serde_json::to_string_pretty(root),
            OutputFormat::Tree => {
                let tree = if options.respect_collapse {
                    root.to_collapsed_tree_string()
                } else {
                    root.to_tree_string()
                };
                return Ok(tree.to_string());
            }
        };
        rendered.with_context("serialize mind-map")
    }

    /// Load, build and render in one go.
    #[instrument(level = "debug", skip(self, identity))]
    pub fn convert(
        &self,
        input: &Path,
        identity: Option<&UserInfo>,
        options: RenderOptions,
    ) -> ApplicationResult<Conversion> {
        let document = self.load(input)?;
        let root = self.build(&document, identity);
        let rendered = self.render(&root, options)?;
        debug!(nodes = root.count(), "converted {}", input.display());
        Ok(Conversion { root, rendered })
    }

    /// Write rendered output, creating parent directories as needed.
    pub fn write(&self, output: &Path, content: &str) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(output)
            .with_path_context("create output directory", output)?;
        self.fs
            .write(output, content)
            .with_path_context("write output", output)
    }
}
