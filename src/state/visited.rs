//! Durable visited-identifier sets
//!
//! One set per identifier domain (users, books). Identifiers only ever move
//! from unseen to seen. After each mutation the caller snapshots the whole
//! set to a JSON array on disk, so an interrupted crawl loses at most the
//! item that was in flight.

use crate::state::StateError;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Which identifier domain a set tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitedDomain {
    Users,
    Books,
}

impl VisitedDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Books => "books",
        }
    }

    /// Snapshot file name inside the state directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Users => "visited_users.json",
            Self::Books => "visited_books.json",
        }
    }
}

/// Grow-only identifier set with whole-file snapshots
#[derive(Debug)]
pub struct VisitedSet {
    domain: VisitedDomain,
    path: PathBuf,
    ids: HashSet<String>,
}

impl VisitedSet {
    /// Loads the snapshot for `domain` from `state_dir`
    ///
    /// A missing, empty, unreadable, or corrupt snapshot yields an empty set.
    pub fn load(domain: VisitedDomain, state_dir: &Path) -> Self {
        let path = state_dir.join(domain.file_name());
        let ids = read_snapshot(&path).unwrap_or_default();

        tracing::debug!(
            "Loaded {} visited {} from {}",
            ids.len(),
            domain.as_str(),
            path.display()
        );

        Self { domain, path, ids }
    }

    /// Deletes the snapshot for `domain`, if any
    pub fn discard(domain: VisitedDomain, state_dir: &Path) -> Result<(), StateError> {
        let path = state_dir.join(domain.file_name());
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::Io { path, source }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Marks `id` as seen; returns true if it was not seen before
    pub fn mark(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    /// Overwrites the durable snapshot with the current set
    ///
    /// Writes to a temp file first and renames it over the snapshot, so a
    /// crash during the write leaves the previous snapshot intact.
    pub fn snapshot(&self) -> Result<(), StateError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| StateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        let json = serde_json::to_vec(&ids)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StateError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }

    pub fn domain(&self) -> VisitedDomain {
        self.domain
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn read_snapshot(path: &Path) -> Option<HashSet<String>> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Could not read {}, starting fresh: {}", path.display(), e);
            return None;
        }
    };

    if data.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Vec<String>>(&data) {
        Ok(ids) => Some(ids.into_iter().collect()),
        Err(e) => {
            tracing::warn!("Corrupt snapshot {}, starting fresh: {}", path.display(), e);
            None
        }
    }
}
