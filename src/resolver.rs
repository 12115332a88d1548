//! Resource resolver (C6): maps a URL path to a filesystem artifact,
//! enforces access policy, and memory-maps the body.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::parser::Verdict;
use crate::MAX_PATH_LEN;

/// Resolves `url_path` against `doc_root`, returning a read-only memory map
/// of the artifact on success, or the verdict to respond with on failure.
///
/// Path-traversal via `..` segments is rejected outright (§9 REDESIGN: the
/// reference implementation concatenates the URL verbatim; this rejects it
/// instead of serving whatever `..` happens to reach) and reported as
/// `NO_RESOURCE`, the same as any other path with no resolvable artifact —
/// it leaks no more information than "nothing there" about why it failed.
pub fn resolve(doc_root: &Path, url_path: &str) -> Result<Mmap, Verdict> {
    if url_path.split('/').any(|segment| segment == "..") {
        return Err(Verdict::NoResource);
    }

    let full = join_bounded(doc_root, url_path)?;

    let meta = fs::metadata(&full).map_err(|_| Verdict::NoResource)?;

    if meta.permissions().mode() & 0o004 == 0 {
        return Err(Verdict::ForbiddenRequest);
    }
    if meta.is_dir() {
        return Err(Verdict::BadRequest);
    }

    let file = fs::File::open(&full).map_err(|_| Verdict::InternalError)?;
    // SAFETY: the mapped file is read-only and private; the server does not
    // guarantee the file won't be truncated concurrently by another
    // process, which would surface as a SIGBUS on access past the new EOF.
    // Out of scope (§1): the filesystem itself is an external collaborator.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|_| Verdict::InternalError)?;

    Ok(mmap)
}

/// Concatenates `doc_root` and `url_path`, rejecting anything whose
/// formatted length would exceed [`MAX_PATH_LEN`] rather than truncating it
/// (§4.6: "concatenate into a path buffer of ≤ 200 bytes; truncation must
/// not overflow"). An over-length path has no resolvable artifact any more
/// than a missing one does, so it's reported as `NO_RESOURCE` too.
fn join_bounded(doc_root: &Path, url_path: &str) -> Result<PathBuf, Verdict> {
    let mut full = PathBuf::from(doc_root);
    full.push(url_path.trim_start_matches('/'));

    if full.as_os_str().len() > MAX_PATH_LEN {
        return Err(Verdict::NoResource);
    }

    Ok(full)
}
