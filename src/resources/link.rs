//! Link resource: one resolved source/destination pair.
use std::path::{Path, PathBuf};

use super::helpers::fs::{
    copy_entry, ensure_parent_dir, entry_exists, remove_entry, same_content,
};
use super::path::clean;
use super::{LinkOutcome, ResourceState};
use crate::config::engine::Flags;
use crate::error::LinkError;
use crate::tasks::graph::LinkMode;

/// A link resource that can be checked and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResource {
    /// The source file/directory (what the link points to).
    pub source: PathBuf,
    /// The destination path (where the link is created).
    pub target: PathBuf,
    /// Symbolic link or copy.
    pub mode: LinkMode,
}

impl LinkResource {
    /// Create a new link resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, mode: LinkMode) -> Self {
        Self {
            source,
            target,
            mode,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> String {
        let arrow = match self.mode {
            LinkMode::Symlink => "->",
            LinkMode::Copy => "<=",
        };
        format!(
            "{} {arrow} {}",
            self.target.display(),
            self.source.display()
        )
    }

    /// Inspect the destination without following a link there.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] if the destination cannot be inspected.
    pub fn current_state(&self) -> Result<ResourceState, LinkError> {
        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ResourceState::Missing);
            }
            Err(e) => return Err(LinkError::io("inspect", &self.target, e)),
        };

        match self.mode {
            LinkMode::Symlink if meta.file_type().is_symlink() => {
                let existing = std::fs::read_link(&self.target)
                    .map_err(|e| LinkError::io("read link", &self.target, e))?;
                if self.points_at_source(&existing) {
                    Ok(ResourceState::Correct)
                } else {
                    Ok(ResourceState::Incorrect {
                        current: format!("points to {}", existing.display()),
                    })
                }
            }
            LinkMode::Copy if entry_exists(&self.source) => {
                let same = same_content(&self.source, &self.target)
                    .map_err(|e| LinkError::io("compare", &self.target, e))?;
                if same {
                    Ok(ResourceState::Correct)
                } else {
                    Ok(ResourceState::Incorrect {
                        current: "content differs".to_string(),
                    })
                }
            }
            _ => Ok(ResourceState::Incorrect {
                current: describe_entry(&meta).to_string(),
            }),
        }
    }

    /// Apply the link according to `flags`. Failures are reported as
    /// [`LinkOutcome::Failed`].
    ///
    /// Decision order: unlink, skip, missing source, absent destination
    /// (create), correct destination (skip), occupied destination (replace
    /// with `clobber`, soft failure without).
    #[must_use]
    pub fn apply(&self, flags: &Flags) -> LinkOutcome {
        let result = if flags.unlink {
            self.try_unlink(flags)
        } else {
            self.try_link(flags)
        };
        result.unwrap_or_else(LinkOutcome::Failed)
    }

    fn try_link(&self, flags: &Flags) -> Result<LinkOutcome, LinkError> {
        if flags.skip_links {
            return Ok(LinkOutcome::SkippedExists);
        }
        if !entry_exists(&self.source) {
            return Err(LinkError::SourceMissing(self.source.clone()));
        }

        match self.current_state()? {
            ResourceState::Missing => {
                self.prepare_parent(flags)?;
                self.create(flags.dry_run)?;
                Ok(LinkOutcome::Created)
            }
            ResourceState::Correct => Ok(LinkOutcome::SkippedExists),
            ResourceState::Incorrect { .. } if flags.clobber => {
                self.remove(flags.dry_run)?;
                self.create(flags.dry_run)?;
                Ok(LinkOutcome::Replaced)
            }
            ResourceState::Incorrect { .. } => Err(LinkError::AlreadyExists(self.target.clone())),
        }
    }

    fn try_unlink(&self, flags: &Flags) -> Result<LinkOutcome, LinkError> {
        match self.current_state()? {
            ResourceState::Missing => Ok(LinkOutcome::SkippedExists),
            ResourceState::Correct => {
                self.remove(flags.dry_run)?;
                Ok(LinkOutcome::Removed)
            }
            ResourceState::Incorrect { .. } if flags.clobber => {
                self.remove(flags.dry_run)?;
                Ok(LinkOutcome::Removed)
            }
            ResourceState::Incorrect { .. } => Ok(LinkOutcome::SkippedExists),
        }
    }

    fn prepare_parent(&self, flags: &Flags) -> Result<(), LinkError> {
        let Some(parent) = self.target.parent() else {
            return Ok(());
        };
        if parent.is_dir() {
            return Ok(());
        }
        if !flags.force_create_parents {
            return Err(LinkError::MissingParent(parent.to_path_buf()));
        }
        if flags.dry_run {
            return Ok(());
        }
        ensure_parent_dir(&self.target).map_err(|e| LinkError::io("create parent", parent, e))
    }

    fn create(&self, dry_run: bool) -> Result<(), LinkError> {
        if dry_run {
            return Ok(());
        }
        match self.mode {
            LinkMode::Symlink => create_symlink(&self.source, &self.target)
                .map_err(|e| LinkError::io("create link", &self.target, e)),
            LinkMode::Copy => copy_entry(&self.source, &self.target)
                .map_err(|e| LinkError::io("copy", &self.target, e)),
        }
    }

    fn remove(&self, dry_run: bool) -> Result<(), LinkError> {
        if dry_run {
            return Ok(());
        }
        remove_entry(&self.target).map_err(|e| LinkError::io("remove", &self.target, e))
    }

    /// Relative link contents are interpreted from the link's directory.
    fn points_at_source(&self, existing: &Path) -> bool {
        let resolved = if existing.is_relative() {
            self.target
                .parent()
                .map_or_else(|| existing.to_path_buf(), |p| p.join(existing))
        } else {
            existing.to_path_buf()
        };
        paths_equal(&clean(&resolved), &clean(&self.source))
    }
}

fn describe_entry(meta: &std::fs::Metadata) -> &'static str {
    if meta.file_type().is_symlink() {
        "link"
    } else if meta.is_dir() {
        "directory"
    } else {
        "regular file"
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}
