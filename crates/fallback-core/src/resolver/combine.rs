//! Candidate path generation.

use fallback_util::fs::normalize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Build the ordered list of candidate paths for a stripped request.
///
/// Directory order is the primary key and extension order the secondary
/// one: every directory contributes its bare candidate followed by one
/// candidate per extension before the next directory is considered.
/// Extensions are appended verbatim (`button` + `.js` → `button.js`,
/// `a.b` + `.js` → `a.b.js`).
#[must_use]
pub fn combine<D, E>(stripped: &str, directories: &[D], extensions: &[E]) -> Vec<PathBuf>
where
    D: AsRef<Path>,
    E: AsRef<str>,
{
    let mut candidates = Vec::with_capacity(directories.len() * (extensions.len() + 1));

    for dir in directories {
        let base = normalize(&dir.as_ref().join(stripped));

        let suffixed: Vec<PathBuf> = extensions
            .iter()
            .map(|ext| {
                let mut s = OsString::from(base.as_os_str());
                s.push(ext.as_ref());
                PathBuf::from(s)
            })
            .collect();

        candidates.push(base);
        candidates.extend(suffixed);
    }

    candidates
}
