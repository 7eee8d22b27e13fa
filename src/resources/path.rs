//! Path resolution for link sources and destinations.
//!
//! Pure: no filesystem access. `~`, `$VAR` and `${VAR}` are expanded from the
//! run environment first and the process environment second, then the result
//! is joined onto its root and cleaned lexically.
use std::path::{Component, Path, PathBuf};

use crate::error::LinkError;
use crate::exec::CommandEnv;

/// The current user's home directory (`USERPROFILE` first on Windows).
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    let var = |k| std::env::var_os(k).filter(|v| !v.is_empty());
    let home = if cfg!(target_os = "windows") {
        var("USERPROFILE").or_else(|| var("HOME"))
    } else {
        var("HOME")
    };
    home.map(PathBuf::from)
}

/// Resolve `raw` against `root`.
///
/// Absolute results are used as-is; relative ones are joined onto `root`.
/// With `confine`, a relative path whose cleaned form leaves `root` is
/// rejected.
///
/// # Errors
///
/// Returns [`LinkError::InvalidPath`] if `raw` is empty, references an
/// undefined variable, or escapes `root` while confined.
pub fn resolve(
    root: &Path,
    raw: &str,
    env: &CommandEnv,
    confine: bool,
) -> Result<PathBuf, LinkError> {
    let invalid = |reason: String| LinkError::InvalidPath {
        path: raw.to_string(),
        reason,
    };

    if raw.trim().is_empty() {
        return Err(invalid("path is empty".to_string()));
    }

    let expanded = expand(raw, env).map_err(invalid)?;
    if expanded.is_empty() {
        return Err(invalid("path expands to nothing".to_string()));
    }
    anchor(root, raw, Path::new(&expanded), confine)
}

/// Resolve `raw` against `root` without expanding `~` or variables.
///
/// Used for paths taken from directory listings, whose names may contain
/// `$` or start with `~`.
///
/// # Errors
///
/// Returns [`LinkError::InvalidPath`] if `raw` is empty or escapes `root`
/// while confined.
pub fn resolve_literal(root: &Path, raw: &str, confine: bool) -> Result<PathBuf, LinkError> {
    if raw.trim().is_empty() {
        return Err(LinkError::InvalidPath {
            path: raw.to_string(),
            reason: "path is empty".to_string(),
        });
    }
    anchor(root, raw, Path::new(raw), confine)
}

fn anchor(root: &Path, raw: &str, path: &Path, confine: bool) -> Result<PathBuf, LinkError> {
    if path.is_absolute() {
        return Ok(clean(path));
    }

    let joined = clean(&root.join(path));
    if confine && !joined.starts_with(clean(root)) {
        return Err(LinkError::InvalidPath {
            path: raw.to_string(),
            reason: format!("escapes {}", root.display()),
        });
    }
    Ok(joined)
}

/// Expand `~` and environment variables in `raw`.
fn expand(raw: &str, env: &CommandEnv) -> Result<String, String> {
    let home = || home_dir().map(|p| p.to_string_lossy().into_owned());
    let lookup = |name: &str| -> Result<Option<String>, &'static str> {
        env.get(name)
            .map(ToString::to_string)
            .or_else(|| std::env::var(name).ok())
            .map(Some)
            .ok_or("undefined")
    };

    shellexpand::full_with_context(raw, home, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| format!("undefined variable ${}", e.var_name))
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` above the root of an absolute path stays at the root; leading `..`
/// of a relative path are kept.
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
