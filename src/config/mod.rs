//! Task document loading, discovery and validation.
pub mod engine;
pub mod loader;
pub mod tasks;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::tasks::graph::TaskGraph;

/// File names probed in the source directory, in order.
pub const CONFIG_CANDIDATES: &[&str] = &["tasks.toml", "tasks.json", "tasks.yml", "tasks.yaml"];

/// Find the task document inside `src_dir`.
///
/// Returns `None` when no candidate exists; the caller then falls back to
/// [`TaskGraph::from_source_dir`].
#[must_use]
pub fn discover(src_dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| src_dir.join(name))
        .find(|path| path.is_file())
}

/// Where the task graph of a run came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphSource {
    /// Loaded from this document.
    File(PathBuf),
    /// Synthesized from the source directory listing.
    Fallback,
}

impl GraphSource {
    /// Document path, if the graph came from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(p) => Some(p),
            Self::Fallback => None,
        }
    }
}

/// Load the task graph for a run.
///
/// An explicit `config` is always loaded. Otherwise the document is
/// discovered in `src_dir`, and without one the fallback graph is built.
///
/// # Errors
///
/// Returns [`ConfigError`] if the document cannot be read or parsed, or the
/// source directory cannot be listed for the fallback.
pub fn load_graph(
    config: Option<&Path>,
    src_dir: &Path,
) -> Result<(TaskGraph, GraphSource), ConfigError> {
    let path = config.map(Path::to_path_buf).or_else(|| discover(src_dir));
    match path {
        Some(path) => {
            let graph = tasks::load(&path)?;
            Ok((graph, GraphSource::File(path)))
        }
        None => Ok((TaskGraph::from_source_dir(src_dir)?, GraphSource::Fallback)),
    }
}
