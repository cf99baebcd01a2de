use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write bytes to `path` atomically: the data goes to a temporary file in the
/// same directory which then replaces the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(contents)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// List the files directly inside `dir` whose name matches `predicate`.
/// A missing directory yields an empty list.
pub fn list_files<F>(dir: &Path, predicate: F) -> io::Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut result = Vec::new();
    if !dir.is_dir() {
        return Ok(result);
    }

    for entry in fs::read_dir(dir)? {
        let entry_path = entry?.path();
        if !entry_path.is_file() {
            continue;
        }
        let matches = entry_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| predicate(name))
            .unwrap_or(false);
        if matches {
            result.push(entry_path);
        }
    }

    Ok(result)
}
