//! Directory driver: translate every page under a source tree into a
//! destination tree.
//!
//! Pages are independent, so they are translated in parallel. A page's output
//! directory is only created once its translation has succeeded, and the file
//! itself is written through a temporary file in the same directory, so a
//! failed page leaves nothing behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::{Config, OutputLayout};
use crate::error::BatchError;

#[derive(Debug)]
pub struct BatchFailure {
    /// Page path relative to the source root.
    pub page: PathBuf,
    pub error: BatchError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Destination paths written, relative to the destination root.
    pub translated: Vec<PathBuf>,
    /// Pages left alone because their output already existed.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Translated(PathBuf),
    Skipped(PathBuf),
    Failed(BatchFailure),
}

/// Relative paths of all pages with `extension` under `root`, sorted.
/// Hidden files and directories are skipped.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<PathBuf>, BatchError> {
    let mut pages = Vec::new();
    walk(root, Path::new(""), extension, &mut pages)?;
    pages.sort();
    Ok(pages)
}

fn walk(dir: &Path, relative: &Path, extension: &str, pages: &mut Vec<PathBuf>) -> Result<(), BatchError> {
    let entries = fs::read_dir(dir).map_err(|e| BatchError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BatchError::io(dir, e))?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            walk(&path, &relative.join(&name), extension, pages)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            pages.push(relative.join(&name));
        }
    }
    Ok(())
}

/// Where the page at `relative` lands, relative to the destination root.
pub fn destination_for(relative: &Path, layout: OutputLayout, target_extension: &str) -> PathBuf {
    match layout {
        OutputLayout::IndexDir => relative.with_extension("").join(format!("index.{target_extension}")),
        OutputLayout::File => relative.with_extension(target_extension),
    }
}

/// Translate every page under `src` into `dest`. With `only_new`, pages whose
/// output already exists are skipped. Per-page failures are collected in the
/// report; only an unreadable source tree fails the whole run.
pub fn run(src: &Path, dest: &Path, config: &Config, only_new: bool) -> Result<BatchReport, BatchError> {
    let pages = discover(src, &config.batch.source_extension)?;
    tracing::info!(pages = pages.len(), src = %src.display(), dest = %dest.display(), "starting batch");

    let outcomes: Vec<Outcome> = pages
        .par_iter()
        .map(|page| {
            let target = destination_for(page, config.batch.layout, &config.batch.target_extension);
            let out_path = dest.join(&target);
            if only_new && out_path.exists() {
                tracing::debug!(page = %page.display(), "output exists, skipping");
                return Outcome::Skipped(page.clone());
            }
            match translate_page(&src.join(page), &out_path, config) {
                Ok(()) => {
                    tracing::info!(page = %page.display(), output = %target.display(), "translated");
                    Outcome::Translated(target)
                }
                Err(error) => {
                    tracing::warn!(page = %page.display(), "{error}");
                    Outcome::Failed(BatchFailure {
                        page: page.clone(),
                        error,
                    })
                }
            }
        })
        .collect();

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Translated(path) => report.translated.push(path),
            Outcome::Skipped(path) => report.skipped.push(path),
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }
    tracing::info!(
        translated = report.translated.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}

fn translate_page(src_path: &Path, out_path: &Path, config: &Config) -> Result<(), BatchError> {
    let input = fs::read_to_string(src_path).map_err(|e| BatchError::io(src_path, e))?;
    let markdown = crate::translate(&input, config)?;

    let parent = out_path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| BatchError::io(parent, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| BatchError::io(parent, e))?;
    tmp.write_all(markdown.as_bytes())
        .map_err(|e| BatchError::io(tmp.path(), e))?;
    tmp.persist(out_path)
        .map_err(|e| BatchError::io(out_path, e.error))?;
    Ok(())
}
