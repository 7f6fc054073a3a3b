use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub type SeenSet = BTreeSet<String>;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to read seen headlines from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write seen headlines to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// Headlines are stored one per line, so embedded line breaks become spaces.
// The same key is used in memory so a reloaded set matches what was added.
fn seen_key(headline: &str) -> Cow<'_, str> {
    let trimmed = headline.trim();
    if trimmed.contains(['\r', '\n']) {
        Cow::Owned(trimmed.replace("\r\n", " ").replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Reads the persisted seen set. A missing file is an empty set.
pub fn load_seen(path: &Path) -> Result<SeenSet, StateError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No seen-headlines file at {}, starting empty", path.display());
            return Ok(SeenSet::new());
        }
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Overwrites `path` with every entry of `seen`, sorted, one per line.
pub fn persist_seen(path: &Path, seen: &SeenSet) -> Result<(), StateError> {
    let mut content = String::new();
    for headline in seen {
        content.push_str(&seen_key(headline));
        content.push('\n');
    }

    fs::write(path, content).map_err(|source| StateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// File-backed set of headlines that were already handled.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    seen: SeenSet,
}

impl SeenStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let seen = load_seen(&path)?;
        info!("Loaded {} seen headlines from {}", seen.len(), path.display());
        Ok(Self { path, seen })
    }

    /// Starts from an empty set without touching the file.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: SeenSet::new(),
        }
    }

    pub fn contains(&self, headline: &str) -> bool {
        self.seen.contains(seen_key(headline).as_ref())
    }

    /// Returns `false` if the headline was already present.
    pub fn add(&mut self, headline: &str) -> bool {
        self.seen.insert(seen_key(headline).into_owned())
    }

    pub fn persist(&self) -> Result<(), StateError> {
        persist_seen(&self.path, &self.seen)?;
        debug!("Persisted {} seen headlines to {}", self.seen.len(), self.path.display());
        Ok(())
    }

    pub fn headlines(&self) -> &SeenSet {
        &self.seen
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::load(dir.path().join("nope.txt")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn membership_is_trimmed_and_case_sensitive() {
        let mut store = SeenStore::empty("unused.txt");
        assert!(store.add("  Fed cuts rates  "));
        assert!(store.contains("Fed cuts rates"));
        assert!(store.contains("Fed cuts rates\n"));
        assert!(!store.contains("fed cuts rates"));
        assert!(!store.add("Fed cuts rates"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn persist_writes_sorted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.txt");
        let mut store = SeenStore::empty(&path);
        store.add("Zeta headline");
        store.add("Alpha headline");
        store.add("Mid headline");
        store.persist().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Alpha headline\nMid headline\nZeta headline\n");
    }

    #[test]
    fn embedded_newlines_collapse_and_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.txt");

        let mut store = SeenStore::empty(&path);
        store.add("Senate passes\nbudget\r\nbill");
        store.persist().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Senate passes budget bill\n");

        let reloaded = SeenStore::load(&path).unwrap();
        assert!(reloaded.contains("Senate passes\nbudget\r\nbill"));
        assert!(reloaded.contains("Senate passes budget bill"));
    }

    #[test]
    fn persist_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.txt");
        fs::write(&path, "old entry\n\n   \n").unwrap();

        let mut store = SeenStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        store.add("new entry");
        store.persist().unwrap();

        let reloaded = load_seen(&path).unwrap();
        assert_eq!(
            reloaded.into_iter().collect::<Vec<_>>(),
            vec!["new entry".to_string(), "old entry".to_string()]
        );
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::empty(dir.path().join("missing-dir").join("seen.txt"));
        assert!(matches!(store.persist(), Err(StateError::Write { .. })));
    }
}
