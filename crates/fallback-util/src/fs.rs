use std::io;
use std::path::{Component, Path, PathBuf};

/// Check whether a path exists without following the error path for absence.
///
/// A missing file, or a path whose parent component is a regular file, is a
/// plain `Ok(false)`. Any other failure (permission denied, I/O error) is
/// returned so callers can tell "absent" apart from "could not look".
///
/// # Errors
/// Returns an error if the metadata lookup fails for a reason other than
/// non-existence.
pub fn path_exists(path: &Path) -> io::Result<bool> {
    match path.metadata() {
        Ok(_) => Ok(true),
        Err(e) if is_absent(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

fn is_absent(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }

    // ENOTDIR: a prefix of the path is a file (e.g. `file.txt/child`)
    #[cfg(unix)]
    if err.raw_os_error() == Some(20) {
        return true;
    }

    false
}

/// Lexically normalize a path, folding `.` and `..` components.
///
/// Does not touch the filesystem, so symlinks are not resolved. A `..` at
/// the root of an absolute path is dropped.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir | Component::Prefix(_)) => true,
                    _ => false,
                };
                if !popped {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }

    out
}

/// Make `path` absolute against `base` (when relative) and normalize it.
#[must_use]
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}
