//! Shared utilities for notesite crates.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tempfile::Builder;

/// Map a function over an iterator in parallel, collecting the results in
/// input order.
pub fn parallel_map<T, F, R>(items: T, func: F) -> Vec<R>
where
    T: IntoParallelIterator,
    T::Iter: rayon::iter::IndexedParallelIterator,
    F: Fn(T::Item) -> R + Send + Sync,
    R: Send,
{
    items.into_par_iter().map(func).collect()
}

/// Atomically write the provided string to `path`, ensuring readers never
/// observe partial content. The write goes through a temporary file in the
/// same directory followed by an atomic rename.
pub fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    fs::create_dir_all(&parent)?;

    let mut tmp = Builder::new().prefix(".notesite").tempfile_in(&parent)?;

    tmp.as_file_mut().write_all(contents.as_bytes())?;
    tmp.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}
