//! Batch conversion of a directory of record-bag dumps.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::application::services::mindmap::{MindMapService, RenderOptions};
use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::config::OutputFormat;

/// Infix of generated files; inputs carrying it are skipped.
pub const GENERATED_SUFFIX: &str = ".mindmap";

/// Result of converting one input file.
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Node count of the written tree, or the error message.
    pub result: Result<usize, String>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Converts every `*.json` document below a directory, in parallel.
pub struct BatchService {
    mindmap: Arc<MindMapService>,
}

impl BatchService {
    pub fn new(mindmap: Arc<MindMapService>) -> Self {
        Self { mindmap }
    }

    /// Input documents below `dir`, sorted, generated outputs excluded.
    pub fn find_inputs(dir: &Path) -> ApplicationResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(ApplicationError::InputNotFound(dir.to_path_buf()));
        }

        let mut inputs = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.with_path_context("scan", dir)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let is_generated = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.ends_with(GENERATED_SUFFIX));
            if is_json && !is_generated {
                inputs.push(path.to_path_buf());
            }
        }
        inputs.sort();
        debug!("found {} input documents in {}", inputs.len(), dir.display());
        Ok(inputs)
    }

    /// Output location for `input`: same relative place under `out_dir`
    /// (or next to the input), named `<stem>.mindmap.<ext>`.
    pub fn output_path(
        input: &Path,
        dir: &Path,
        out_dir: Option<&Path>,
        format: OutputFormat,
    ) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = format!("{}{}.{}", stem, GENERATED_SUFFIX, format.extension());

        let parent = input.parent().unwrap_or(dir);
        match out_dir {
            Some(out) => {
                let relative = parent.strip_prefix(dir).unwrap_or(Path::new(""));
                out.join(relative).join(file_name)
            }
            None => parent.join(file_name),
        }
    }

    /// Convert all inputs; a failing file does not stop the others.
    #[instrument(level = "debug", skip(self))]
    pub fn convert_dir(
        &self,
        dir: &Path,
        out_dir: Option<&Path>,
        options: RenderOptions,
    ) -> ApplicationResult<Vec<BatchOutcome>> {
        let inputs = Self::find_inputs(dir)?;

        let outcomes: Vec<BatchOutcome> = inputs
            .par_iter()
            .map(|input| {
                let output = Self::output_path(input, dir, out_dir, options.format);
                let result = self
                    .mindmap
                    .convert(input, None, options)
                    .and_then(|conversion| {
                        self.mindmap.write(&output, &conversion.rendered)?;
                        Ok(conversion.root.count())
                    })
                    .map_err(|e| {
                        warn!("failed to convert {}: {}", input.display(), e);
                        e.to_string()
                    });
                BatchOutcome {
                    input: input.clone(),
                    output,
                    result,
                }
            })
            .collect();

        Ok(outcomes)
    }
}
