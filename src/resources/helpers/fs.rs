//! File-system helpers shared by the link resource.
//!
//! All helpers inspect entries with `symlink_metadata`, so a link is always
//! treated as the link itself and never as what it points to.
use std::io;
use std::path::Path;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Whether anything (including a dangling link) occupies `path`.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Check if metadata represents a directory-like entry.
///
/// On Windows `symlink_metadata().is_dir()` is `false` for directory
/// symlinks, so the raw `FILE_ATTRIBUTE_DIRECTORY` bit is checked instead.
#[must_use]
pub fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Remove whatever occupies `path`: a link (file or directory link), a
/// regular file, or a real directory tree.
///
/// Links are removed without touching their targets. Does nothing if
/// `path` does not exist.
///
/// # Errors
///
/// Returns an error if the entry exists but cannot be removed.
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.file_type().is_symlink() {
        if is_dir_like(&meta) {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    } else if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Copy `src` (file or directory tree) to `dst`.
///
/// Symlinks inside a source tree are followed and their content copied.
///
/// # Errors
///
/// Returns an error if any entry cannot be read or written.
pub fn copy_entry(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        std::fs::copy(src, dst).map(|_| ())
    }
}

/// Recursively copy a directory tree.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Whether `copy` is a real (non-link) file or tree with the same content as
/// `original`.
///
/// # Errors
///
/// Returns an error if either side cannot be read.
pub fn same_content(original: &Path, copy: &Path) -> io::Result<bool> {
    let copy_meta = std::fs::symlink_metadata(copy)?;
    if copy_meta.file_type().is_symlink() {
        return Ok(false);
    }

    if original.is_dir() {
        if !copy_meta.is_dir() {
            return Ok(false);
        }
        let names = sorted_names(original)?;
        if names != sorted_names(copy)? {
            return Ok(false);
        }
        for name in &names {
            if !same_content(&original.join(name), &copy.join(name))? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    if !copy_meta.is_file() || copy_meta.len() != std::fs::metadata(original)?.len() {
        return Ok(false);
    }
    Ok(std::fs::read(original)? == std::fs::read(copy)?)
}

fn sorted_names(dir: &Path) -> io::Result<Vec<std::ffi::OsString>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| e.file_name()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
