use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::models::{IMAGE_PNG, TEXT_PLAIN, TEXT_URI_LIST};

/// Pairs of (platform type name, wire format)
pub type TypeTable = &'static [(&'static str, &'static str)];

/// NSPasteboard uniform type identifiers
pub const MACOS_TYPES: TypeTable = &[
    ("public.utf8-plain-text", TEXT_PLAIN),
    ("public.png", IMAGE_PNG),
    ("public.file-url", TEXT_URI_LIST),
];

/// Registered Win32 clipboard format names
/// Text and file drops have no registered name and go through the typed API
pub const WINDOWS_TYPES: TypeTable = &[("PNG", IMAGE_PNG)];

/// X11 selection targets are already MIME names
pub const X11_TYPES: TypeTable = &[];

/// Type table for the platform this binary was built for
pub fn platform_types() -> TypeTable {
    if cfg!(target_os = "macos") {
        MACOS_TYPES
    } else if cfg!(target_os = "windows") {
        WINDOWS_TYPES
    } else {
        X11_TYPES
    }
}

/// Wire format for a platform type name; unknown names pass through
pub fn to_wire<'a>(table: TypeTable, native: &'a str) -> &'a str {
    table
        .iter()
        .find(|(name, _)| *name == native)
        .map(|(_, wire)| *wire)
        .unwrap_or(native)
}

/// Platform type name for a wire format; unknown formats pass through
pub fn to_native<'a>(table: TypeTable, wire: &'a str) -> &'a str {
    table
        .iter()
        .find(|(_, format)| *format == wire)
        .map(|(name, _)| *name)
        .unwrap_or(wire)
}

/// Characters escaped in the path part of a file URI
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build a `text/uri-list` body from platform file entries
///
/// Entries may be plain paths or `file://` URLs. Both come out as
/// standardized file URIs, one per line, CRLF separated.
pub fn uri_list_from_files(files: &[String]) -> String {
    files
        .iter()
        .map(|entry| {
            let path = match entry.strip_prefix("file://") {
                Some(rest) => percent_decode_str(strip_host(rest)).decode_utf8_lossy().into_owned(),
                None => entry.clone(),
            };
            file_uri(&path)
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Extract local paths from a `text/uri-list` body
/// Comments, blank lines and non-file URIs are skipped
pub fn files_from_uri_list(uri_list: &str) -> Vec<String> {
    uri_list
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.strip_prefix("file://"))
        .map(|rest| {
            let decoded = percent_decode_str(strip_host(rest)).decode_utf8_lossy();
            let path = standardize(&decoded);
            // "/C:/dir" is a drive path
            match path.strip_prefix('/') {
                Some(drive) if is_drive_path(drive) => drive.to_string(),
                _ => path,
            }
        })
        .collect()
}

fn file_uri(path: &str) -> String {
    let mut path = path.replace('\\', "/");
    if is_drive_path(&path) {
        path.insert(0, '/');
    }
    format!(
        "file://{}",
        utf8_percent_encode(&standardize(&path), PATH_SEGMENT)
    )
}

/// "file://localhost/x" and "file:///x" both name "/x"
fn strip_host(rest: &str) -> &str {
    rest.strip_prefix("localhost").unwrap_or(rest)
}

fn is_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Drop `.` segments, resolve `..` and collapse repeated slashes
fn standardize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if path.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    }
}
