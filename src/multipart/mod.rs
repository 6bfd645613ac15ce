//! Hand-rolled `multipart/form-data` decoder (RFC 7578).
//!
//! The upload endpoint receives the raw request body as bytes and splits it
//! on the boundary delimiter without going through a multipart library, so
//! binary payloads survive byte-exact. Malformed segments are skipped rather
//! than rejected; the caller decides which field names it requires.

use std::collections::HashMap;

/// A single decoded form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain field, body decoded as UTF-8 text.
    Text(String),
    /// File field: `filename` from Content-Disposition plus the raw bytes.
    File { filename: String, data: Vec<u8> },
}

impl Part {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(s) => Some(s),
            Part::File { .. } => None,
        }
    }
}

/// Extract the boundary token from a `Content-Type` header value.
///
/// Returns the substring after `boundary=`, with surrounding quotes and any
/// trailing parameters removed. The caller is expected to have checked for
/// `multipart/form-data` already.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let idx = content_type.find("boundary=")?;
    let raw = &content_type[idx + "boundary=".len()..];
    let raw = raw.split(';').next().unwrap_or(raw).trim().trim_matches('"');

    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Decode a full multipart body into a field-name -> part mapping.
///
/// Splitting happens on `--{boundary}` as bytes. Segments without the
/// `CRLF CRLF` header separator or without a `name` parameter are dropped.
/// Duplicate field names are last-write-wins.
pub fn parse(body: &[u8], boundary: &str) -> HashMap<String, Part> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = HashMap::new();

    for segment in split_on(body, &delimiter) {
        // The terminal marker after the last boundary is "--" (plus CRLF)
        if segment.is_empty() || segment.starts_with(b"--") {
            continue;
        }

        // Each segment starts with the CRLF that ended the boundary line
        let segment = segment.strip_prefix(b"\r\n").unwrap_or(segment);

        let Some(sep) = find(segment, b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&segment[..sep]);
        let mut data = &segment[sep + 4..];

        // The framing appends one CRLF before the next boundary
        if data.ends_with(b"\r\n") {
            data = &data[..data.len() - 2];
        }

        let Some(disposition) = headers
            .lines()
            .find(|l| l.to_ascii_lowercase().starts_with("content-disposition"))
        else {
            continue;
        };
        let Some(name) = disposition_param(disposition, "name") else {
            continue;
        };

        let part = match disposition_param(disposition, "filename") {
            Some(filename) => Part::File {
                filename,
                data: data.to_vec(),
            },
            None => Part::Text(String::from_utf8_lossy(data).into_owned()),
        };

        parts.insert(name, part);
    }

    parts
}

/// Find the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Split `haystack` on every occurrence of `needle`.
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut rest = haystack;

    while let Some(pos) = find(rest, needle) {
        segments.push(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    segments.push(rest);
    segments
}

/// Extract a quoted parameter (`name="..."`) from a Content-Disposition
/// line. Matches on a token boundary so `name` does not hit `filename`.
fn disposition_param(header: &str, key: &str) -> Option<String> {
    let pattern = format!("{}=\"", key);
    let mut search_from = 0;

    while let Some(rel) = header[search_from..].find(&pattern) {
        let idx = search_from + rel;
        let value_start = idx + pattern.len();
        let on_token_boundary =
            idx == 0 || !header.as_bytes()[idx - 1].is_ascii_alphanumeric();

        if on_token_boundary {
            let rest = &header[value_start..];
            let end = rest.find('"')?;
            return Some(rest[..end].to_string());
        }
        search_from = value_start;
    }
    None
}
