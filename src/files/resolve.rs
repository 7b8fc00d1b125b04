//! Request path → filesystem resolution.
//!
//! Resolution is purely lexical up to the single `stat` call: the URL path is
//! normalized into segments confined to the server root, hidden segments are
//! rejected, and only then is the filesystem consulted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{Result, ServeError};

/// Bytes escaped when a decoded segment is written back into a `Location`.
const LOCATION_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Candidate files served in place of a directory, in priority order.
pub const INDEX_FILES: &[&str] = &["index.html", "index.xhtml"];

/// What the filesystem said about a resource, taken from one `stat` call.
#[derive(Debug, Clone)]
pub struct ResourceMetadata {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

impl ResourceMetadata {
    fn from_fs(path: PathBuf, meta: &fs::Metadata) -> Self {
        Self {
            path,
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
        }
    }

    /// Stats `path`. Any failure, including permission errors, is `NotFound`.
    pub fn stat(path: PathBuf) -> Result<Self> {
        let meta = fs::metadata(&path).map_err(|_| ServeError::NotFound)?;
        Ok(Self::from_fs(path, &meta))
    }
}

/// Outcome of resolving a request path.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A regular file (possibly an index file standing in for its directory).
    File(ResourceMetadata),
    /// Directory requested without a trailing slash; value is the `Location`.
    Redirect(String),
    /// Directory with no index file, listing enabled.
    Listing(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a decoded URL path (leading `/` included).
    pub fn resolve(&self, url_path: &str, listing_enabled: bool) -> Result<Resolution> {
        let segments = normalize(url_path);

        if segments.iter().any(|s| s.starts_with('.')) {
            return Err(ServeError::PathRejected);
        }
        if segments.iter().any(|s| s.contains('\0')) {
            return Err(ServeError::NotFound);
        }

        let mut fs_path = self.root.clone();
        fs_path.extend(&segments);

        let resource = ResourceMetadata::stat(fs_path)?;
        if !resource.is_dir {
            return Ok(Resolution::File(resource));
        }

        if !segments.is_empty() && !url_path.ends_with('/') {
            return Ok(Resolution::Redirect(redirect_location(&segments)));
        }

        if let Some(index) = self.find_index(&resource.path) {
            return Ok(Resolution::File(index));
        }

        if listing_enabled {
            Ok(Resolution::Listing(resource.path))
        } else {
            Err(ServeError::NotFound)
        }
    }

    fn find_index(&self, dir: &Path) -> Option<ResourceMetadata> {
        INDEX_FILES.iter().find_map(|name| {
            let candidate = dir.join(name);
            match fs::metadata(&candidate) {
                Ok(meta) if !meta.is_dir() => Some(ResourceMetadata::from_fs(candidate, &meta)),
                _ => None,
            }
        })
    }
}

/// Lexically cleans a URL path into segments below the root.
///
/// Empty and `.` segments vanish, `..` pops the previous segment and never
/// climbs above the root.
pub fn normalize(url_path: &str) -> Vec<&str> {
    let mut segments = Vec::new();

    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments
}

/// `/seg/seg/` with every segment percent-encoded again.
fn redirect_location(segments: &[&str]) -> String {
    let mut location = String::from("/");
    for segment in segments {
        location.extend(utf8_percent_encode(segment, LOCATION_ESCAPES));
        location.push('/');
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_clamps() {
        assert_eq!(normalize("/a//b/./c/"), vec!["a", "b", "c"]);
        assert_eq!(normalize("/a/../b"), vec!["b"]);
        assert_eq!(normalize("/../../etc/passwd"), vec!["etc", "passwd"]);
        assert!(normalize("/").is_empty());
    }

    #[test]
    fn hidden_segment_is_rejected_before_stat() {
        let resolver = PathResolver::new("/nonexistent-root");
        assert!(matches!(
            resolver.resolve("/a/.git/config", true),
            Err(ServeError::PathRejected)
        ));
    }

    #[test]
    fn redirect_location_reencodes_segments() {
        assert_eq!(redirect_location(&["docs"]), "/docs/");
        assert_eq!(redirect_location(&["a?b", "x y"]), "/a%3Fb/x%20y/");
        assert_eq!(redirect_location(&["100%", "café"]), "/100%25/caf%C3%A9/");
    }
}
