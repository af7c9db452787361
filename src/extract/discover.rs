use crate::error::{EtlError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const DEFAULT_FILE_PATTERN: &str = r"\.json$";

static JSON_FILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_FILE_PATTERN).unwrap());

/// Matches file names (not full paths) of input files
#[derive(Debug, Clone)]
pub struct FilePattern(Regex);

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(FilePattern(Regex::new(pattern)?))
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.0.is_match(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for FilePattern {
    fn default() -> Self {
        FilePattern(JSON_FILE_REGEX.clone())
    }
}

/// Recursively collect the absolute paths of all files under `root`
/// whose name matches `pattern`.
///
/// Symlinks are followed, so linked files and directories are picked up
/// like regular ones.
///
/// Paths come back sorted so that "last occurrence" dedup rules see the
/// same file order on every run. An empty tree yields an empty list;
/// deciding whether that is fatal is left to the caller.
pub fn get_files<P: AsRef<Path>>(root: P, pattern: &FilePattern) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root.as_ref())
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !pattern.matches(entry.path()) {
            continue;
        }

        let path = entry.path().canonicalize().map_err(|source| EtlError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Discovered input file");
        files.push(path);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_recursive_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("A").join("B");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("top.json"), "{}").unwrap();
        fs::write(nested.join("deep.json"), "{}").unwrap();
        fs::write(nested.join("notes.txt"), "ignored").unwrap();

        let files = get_files(dir.path(), &FilePattern::default()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.is_absolute()));
        assert!(files.iter().any(|p| p.ends_with("A/B/deep.json")));
        assert!(files.iter().any(|p| p.ends_with("top.json")));
    }

    #[test]
    fn test_empty_directory_yields_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = get_files(dir.path(), &FilePattern::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_custom_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("events.jsonl"), "{}").unwrap();
        fs::write(dir.path().join("events.json"), "{}").unwrap();

        let pattern = FilePattern::new(r"\.jsonl$").unwrap();
        let files = get_files(dir.path(), &pattern).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("events.jsonl"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_discovered() {
        let target_dir = tempfile::tempdir().unwrap();
        let target = target_dir.path().join("outside.json");
        fs::write(&target, "{}").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linked.json")).unwrap();
        std::os::unix::fs::symlink(target_dir.path(), dir.path().join("linked_dir")).unwrap();

        let files = get_files(dir.path(), &FilePattern::default()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.ends_with("outside.json")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(FilePattern::new("("), Err(EtlError::Pattern(_))));
    }
}
