//! Extension to content-type lookup.

use std::collections::HashMap;
use std::path::Path;

/// Content type used for any extension the registry does not know.
pub const OCTET_STREAM: &str = "application/octet-stream";

const DEFAULT_TYPES: &[(&str, &str)] = &[
    // common web types
    ("html", "text/html"),
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("xml", "text/xml"),
    ("xhtml", "application/xhtml+xml"),
    ("txt", "text/plain"),
    ("json", "application/json"),
    // images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    // media
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("m4a", "audio/x-m4a"),
    ("avi", "video/x-msvideo"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("ts", "video/mp2t"),
    ("webm", "video/webm"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    // fonts
    ("eot", "application/vnd.ms-fontobject"),
    ("ttf", "font/ttf"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("otf", "font/otf"),
    // documents
    ("pdf", "application/pdf"),
    ("csv", "text/csv"),
    // archives
    ("7z", "application/x-ms-compressed"),
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
];

/// Immutable extension → MIME table, built once at startup and shared.
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    types: HashMap<&'static str, &'static str>,
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self {
            types: DEFAULT_TYPES.iter().copied().collect(),
        }
    }
}

impl MimeRegistry {
    /// Content type for a bare extension (no dot). Case-insensitive.
    pub fn lookup(&self, extension: &str) -> &'static str {
        self.types
            .get(extension.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(OCTET_STREAM)
    }
}

/// Text after the last `.` of the file name; empty when there is none.
pub fn extension(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        let mimes = MimeRegistry::default();
        assert_eq!(mimes.lookup("html"), "text/html");
        assert_eq!(mimes.lookup("css"), "text/css");
        assert_eq!(mimes.lookup("js"), "application/javascript");
        assert_eq!(mimes.lookup("HTML"), "text/html");
    }

    #[test]
    fn test_extension_takes_last_dot() {
        assert_eq!(extension(Path::new("a/b/archive.tar.gz")), "gz");
        assert_eq!(extension(Path::new("docs/index.html")), "html");
        assert_eq!(extension(Path::new("Makefile")), "");
        assert_eq!(extension(Path::new("trailing.")), "");
    }
}
