//! HTML directory index.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{Result, ServeError};

/// Characters escaped in entry hrefs.
const HREF_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Format of the last-modified column, e.g. `6 Nov 1994 08:49`.
pub const LISTING_DATE_FORMAT: &str = "%-d %b %Y %H:%M";

const STYLE: &str = "\
    html, body, table, tr { width: 100%; }
    .main { max-width: 992px; margin: 0 auto; }
    h2 { margin-top: 5px; margin-bottom: 5px; }
    tr { vertical-align: top; }
    a { text-decoration: none; }
    a:hover { text-decoration: underline; }
    td.name { width: 60%; }
    td.size, td.last-modified { width: 20%; }";

/// One visible row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

impl ListingEntry {
    /// Name as linked and displayed; directories get a trailing `/`.
    pub fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Reads the visible entries of `dir`, sorted by name.
///
/// Names starting with `.` are skipped. Failing to read the directory is
/// `NotFound`; entries that vanish or cannot be stat'ed mid-read are skipped.
pub fn read_entries(dir: &Path) -> Result<Vec<ListingEntry>> {
    let reader = fs::read_dir(dir).map_err(|_| ServeError::NotFound)?;
    let mut entries = Vec::new();

    for entry in reader {
        let entry = entry.map_err(|_| ServeError::NotFound)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        // follow symlinks so a linked directory lists as a directory
        let meta = match fs::metadata(entry.path()).or_else(|_| entry.metadata()) {
            Ok(meta) => meta,
            Err(_) => continue,
        };

        entries.push(ListingEntry {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Renders the listing page for `display_path` (the request path).
pub fn render(display_path: &str, entries: &[ListingEntry]) -> Result<String> {
    let title = escape_html(display_path);
    let mut html = String::with_capacity(1024 + entries.len() * 256);

    write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n  <title>Index of {title}</title>\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <style>\n{STYLE}\n  </style>\n</head>\n<body>\n  <div class=\"main\">\n    \
         <h2>Index of {title}</h2>\n    <table>\n      <tr>\n        \
         <td class=\"name\"><b>Name</b></td>\n        \
         <td class=\"size\"><b>Size (bytes)</b></td>\n        \
         <td class=\"last-modified\"><b>Last Modified</b></td>\n      </tr>\n"
    )?;

    for entry in entries {
        let shown = entry.display_name();
        let href = utf8_percent_encode(&shown, HREF_ESCAPES);
        let (size, modified) = if entry.is_dir {
            ("-".to_string(), "-".to_string())
        } else {
            (entry.size.to_string(), format_listing_time(entry.modified))
        };

        write!(
            html,
            "      <tr>\n        <td class=\"name\"><a href=\"{href}\">{}</a></td>\n        \
             <td class=\"size\">{size}</td>\n        \
             <td class=\"last-modified\">{modified}</td>\n      </tr>\n",
            escape_html(&shown)
        )?;
    }

    html.write_str("    </table>\n  </div>\n</body>\n</html>\n")?;
    Ok(html)
}

/// Reads and renders `dir` in one go.
pub fn render_directory(dir: &Path, display_path: &str) -> Result<String> {
    let entries = read_entries(dir)?;
    render(display_path, &entries)
}

pub fn format_listing_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format(LISTING_DATE_FORMAT)
        .to_string()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
