//! Mount-point routing.
//!
//! Each controller is mounted under a path prefix (`/widgets`). A request is
//! routed to the longest prefix that matches on a segment boundary; the rest
//! of the path becomes the request's segments.

use tracing::debug;

use crate::error::ConfigError;
use crate::request::{split_segments, SegmentVec};

/// Canonical form of a mount prefix: leading `/`, no trailing `/`, `/` for
/// the root.
#[must_use]
pub fn normalize_mount(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Prefix table from mount points to `T`.
pub struct MountTable<T> {
    // longest prefix first
    entries: Vec<(String, T)>,
}

impl<T> Default for MountTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> MountTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prefix: &str, value: T) -> Result<(), ConfigError> {
        let prefix = normalize_mount(prefix);
        if self.entries.iter().any(|(p, _)| *p == prefix) {
            return Err(ConfigError::DuplicateMount(prefix));
        }
        self.entries.push((prefix, value));
        self.entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Ok(())
    }

    /// Find the entry for `path`, returning its mount point and the
    /// remaining segments.
    pub fn route(&self, path: &str) -> Option<(&str, &T, SegmentVec)> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        for (prefix, value) in &self.entries {
            let remainder = if prefix == "/" {
                Some(path)
            } else {
                path.strip_prefix(prefix.as_str())
                    .filter(|r| r.is_empty() || r.starts_with('/'))
            };
            if let Some(remainder) = remainder {
                let segments = split_segments(remainder);
                debug!(path = %path, mount = %prefix, segments = segments.len(), "Mount matched");
                return Some((prefix.as_str(), value, segments));
            }
        }
        None
    }

    #[must_use]
    pub fn mounts(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
