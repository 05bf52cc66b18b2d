//! Template search path.
//!
//! [`SearchPath`] is a stack of directories used to locate included
//! templates. The most recently pushed directory is searched first; the
//! current working directory is always probed before any of them.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Result, SigilError};

/// Ordered directories probed by [`SearchPath::look`].
///
/// Entries are never deduplicated: pushing the same directory twice means
/// it must be popped twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Creates an empty search path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `dir` the most preferred directory.
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.insert(0, dir.into());
    }

    /// Discards the most recently pushed directory.
    ///
    /// # Panics
    ///
    /// Panics if the search path is empty. Pushes and pops must pair up.
    pub fn pop(&mut self) {
        assert!(
            !self.dirs.is_empty(),
            "pop_path called on an empty search path"
        );
        self.dirs.remove(0);
    }

    /// Directories in search order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Resolves `file` to the first existing candidate.
    ///
    /// Rooted paths are returned unchanged without touching the filesystem.
    /// Relative paths are joined with the current directory, then with each
    /// search directory in order.
    pub fn look(&self, file: impl AsRef<Path>) -> Result<PathBuf> {
        let file = file.as_ref();
        if file.has_root() {
            return Ok(file.to_path_buf());
        }

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        for dir in std::iter::once(cwd.as_path()).chain(self.dirs.iter().map(PathBuf::as_path)) {
            let candidate = dir.join(file);
            trace!(candidate = %candidate.display(), "probing");
            if candidate.exists() {
                debug!(file = %file.display(), found = %candidate.display(), "resolved template path");
                return Ok(candidate);
            }
        }

        Err(SigilError::NotFound {
            file: file.display().to_string(),
            search: self.dirs.clone(),
        })
    }
}

impl From<Vec<PathBuf>> for SearchPath {
    /// Builds a search path whose first element is the most preferred.
    fn from(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const FILE: &str = "sigil-path-lookup.tmpl";

    fn dir_with_file() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FILE), "x").unwrap();
        dir
    }

    #[test]
    fn test_push_prepends() {
        let mut path = SearchPath::new();
        path.push("/a");
        path.push("/b");
        assert_eq!(path.dirs(), &[PathBuf::from("/b"), PathBuf::from("/a")]);
    }

    #[test]
    fn test_pop_removes_most_recent() {
        let mut path = SearchPath::new();
        path.push("/a");
        path.push("/b");
        path.pop();
        assert_eq!(path.dirs(), &[PathBuf::from("/a")]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut path = SearchPath::new();
        path.push("/a");
        path.push("/a");
        path.pop();
        assert_eq!(path.dirs(), &[PathBuf::from("/a")]);
    }

    #[test]
    #[should_panic(expected = "empty search path")]
    fn test_pop_empty_panics() {
        SearchPath::new().pop();
    }

    #[test]
    fn test_absolute_path_bypasses_search() {
        let mut path = SearchPath::new();
        path.push("/nowhere");
        assert_eq!(path.look("/a/b").unwrap(), PathBuf::from("/a/b"));
    }

    #[test]
    #[serial]
    fn test_latest_push_wins() {
        let dir_a = dir_with_file();
        let dir_b = dir_with_file();
        let mut path = SearchPath::new();
        path.push(dir_a.path());
        path.push(dir_b.path());
        assert_eq!(path.look(FILE).unwrap(), dir_b.path().join(FILE));

        path.pop();
        assert_eq!(path.look(FILE).unwrap(), dir_a.path().join(FILE));
    }

    #[test]
    #[serial]
    fn test_falls_back_to_earlier_push() {
        let dir_a = dir_with_file();
        let dir_b = TempDir::new().unwrap();
        let mut path = SearchPath::new();
        path.push(dir_a.path());
        path.push(dir_b.path());
        assert_eq!(path.look(FILE).unwrap(), dir_a.path().join(FILE));
    }

    #[test]
    #[serial]
    fn test_current_dir_wins() {
        let cwd_dir = dir_with_file();
        let dir_b = dir_with_file();
        let original = env::current_dir().unwrap();
        env::set_current_dir(cwd_dir.path()).unwrap();

        let mut path = SearchPath::new();
        path.push(dir_b.path());
        let found = path.look(FILE);
        let expected = env::current_dir().unwrap().join(FILE);
        env::set_current_dir(original).unwrap();

        assert_eq!(found.unwrap(), expected);
    }

    #[test]
    #[serial]
    fn test_not_found_names_file_and_search_list() {
        let dir_a = TempDir::new().unwrap();
        let mut path = SearchPath::new();
        path.push(dir_a.path());
        let err = path.look("sigil-definitely-missing.tmpl").unwrap_err();
        match err {
            SigilError::NotFound { file, search } => {
                assert_eq!(file, "sigil-definitely-missing.tmpl");
                assert_eq!(search, vec![dir_a.path().to_path_buf()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
