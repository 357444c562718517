//! Path canonicalization relative to the project root
//!
//! `normalize` is purely lexical. `compute_relative` also consults the
//! filesystem so that symlinks cannot be used to reach a protected zone
//! under an innocent-looking name, and it tolerates files that do not exist
//! yet (the common case for a write about to happen).

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Lexically normalize a `/`-separated path
///
/// Empty and `.` segments are dropped and `..` pops the previous segment.
/// A `..` with nothing left to pop is absorbed, so `/a/../..` is `/`. A
/// leading `/` is preserved. The result is a fixed point:
/// `normalize(&normalize(p)) == normalize(p)`.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Resolve symlinks in `path` as far as the filesystem allows
///
/// Existing paths are canonicalized. For a path that does not exist, the
/// nearest existing ancestor is canonicalized and the remainder re-attached,
/// so `link/new.txt` resolves through `link` even before `new.txt` exists.
/// A dangling symlink resolves to its intended target. Anything else falls
/// back to the input unchanged.
pub fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        trace!("Canonicalized {:?} -> {:?}", path, canonical);
        return canonical;
    }

    if let Ok(target) = fs::read_link(path) {
        let target = match path.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        };
        debug!("Dangling symlink {:?} points at {:?}", path, target);
        return resolve_via_ancestor(&target).unwrap_or(target);
    }

    resolve_via_ancestor(path).unwrap_or_else(|| {
        debug!("Could not resolve {:?}, using it unchanged", path);
        path.to_path_buf()
    })
}

fn resolve_via_ancestor(path: &Path) -> Option<PathBuf> {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        let Ok(canonical) = fs::canonicalize(ancestor) else {
            continue;
        };
        let rest = path.strip_prefix(ancestor).ok()?;
        trace!("Resolved {:?} through ancestor {:?}", path, canonical);
        return Some(canonical.join(rest));
    }
    None
}

/// Path of `file` relative to `root`, after resolving symlinks on both sides
///
/// Relative `file` inputs are taken as relative to `root`. When `file` lies
/// outside `root`, the result climbs out with `..` segments. `file == root`
/// yields the empty string.
pub fn compute_relative(file: &Path, root: &Path) -> String {
    let joined = if file.is_absolute() {
        file.to_path_buf()
    } else {
        root.join(file)
    };

    let file = normalize(&resolve(&joined).to_string_lossy());
    let root = normalize(&resolve(root).to_string_lossy());

    if file == root {
        return String::new();
    }

    let prefix = if root.ends_with('/') {
        root.clone()
    } else {
        format!("{root}/")
    };

    match file.strip_prefix(&prefix) {
        Some(rel) => rel.to_string(),
        None => relative_between(&file, &root),
    }
}

/// Generic relative path from `root` to `file`, both normalized
fn relative_between(file: &str, root: &str) -> String {
    let file_segments: Vec<&str> = file.split('/').filter(|s| !s.is_empty()).collect();
    let root_segments: Vec<&str> = root.split('/').filter(|s| !s.is_empty()).collect();

    let common = file_segments
        .iter()
        .zip(&root_segments)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; root_segments.len() - common];
    parts.extend_from_slice(&file_segments[common..]);
    parts.join("/")
}
