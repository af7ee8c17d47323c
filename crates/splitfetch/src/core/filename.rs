use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::data::Headers;

const DEFAULT_BASE: &str = "Unknown";
const DEFAULT_EXTENSION: &str = ".unk";

/// A save name split into base and extension (with its leading dot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub base: String,
    pub extension: String,
}

impl ResolvedName {
    fn new(base: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            extension: extension.into(),
        }
    }

    /// Split a complete file name at its last dot.
    fn from_file_name(name: &str) -> Self {
        match name.rfind('.') {
            Some(idx) if idx > 0 => Self::new(&name[..idx], &name[idx..]),
            _ => Self::new(name, ""),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.base, self.extension)
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.extension)
    }
}

/// Derive a save name from response headers and the request URL.
///
/// Precedence:
/// 1. `Content-Disposition` (`filename*=` then `filename=`)
/// 2. `Content-Type` mapped to a known extension, using the URL stem as base
/// 3. The last URL path segment split at its last dot
///
/// Never fails: missing pieces fall back to `Unknown` and `.unk`.
///
/// # Examples
///
/// ```
/// use splitfetch::{Headers, resolve_filename};
///
/// let name = resolve_filename(&Headers::default(), "http://x/a/b/noext");
/// assert_eq!(name.file_name(), "Unknown.unk");
/// ```
pub fn resolve_filename(headers: &Headers, url: &str) -> ResolvedName {
    if let Some(name) = headers
        .first("content-disposition")
        .and_then(disposition_filename)
    {
        return ResolvedName::from_file_name(&name);
    }

    if let Some(extension) = headers
        .first("content-type")
        .and_then(extension_for_content_type)
    {
        let base = last_segment(url)
            .map(|segment| stem(&segment).to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE.to_string());
        return ResolvedName::new(base, extension);
    }

    from_path(url)
}

/// Canonical extension for a MIME type, ignoring parameters such as `charset`.
///
/// Returns `None` for unknown or generic types like `application/octet-stream`.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let extension = match mime.as_str() {
        "application/pdf" => ".pdf",
        "application/zip" | "application/x-zip-compressed" => ".zip",
        "application/gzip" | "application/x-gzip" => ".gz",
        "application/x-tar" => ".tar",
        "application/x-bzip2" => ".bz2",
        "application/x-xz" => ".xz",
        "application/zstd" => ".zst",
        "application/x-7z-compressed" => ".7z",
        "application/vnd.rar" | "application/x-rar-compressed" => ".rar",
        "application/java-archive" => ".jar",
        "application/vnd.android.package-archive" => ".apk",
        "application/vnd.debian.binary-package" => ".deb",
        "application/x-rpm" => ".rpm",
        "application/x-apple-diskimage" => ".dmg",
        "application/x-iso9660-image" => ".iso",
        "application/x-msdownload" => ".exe",
        "application/wasm" => ".wasm",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/javascript" | "text/javascript" => ".js",
        "text/plain" => ".txt",
        "text/html" => ".html",
        "text/css" => ".css",
        "text/csv" => ".csv",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/wav" | "audio/x-wav" => ".wav",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/x-matroska" => ".mkv",
        "video/quicktime" => ".mov",
        _ => return None,
    };
    Some(extension)
}

fn disposition_filename(value: &str) -> Option<String> {
    let params: Vec<(&str, &str)> = value
        .split(';')
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();

    // RFC 5987 form wins: charset'lang'percent-encoded
    let extended = params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, value)| value.rsplit('\'').next())
        .map(|encoded| percent_decode_str(encoded).decode_utf8_lossy().into_owned());

    let plain = || {
        params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("filename"))
            .map(|(_, value)| value.trim_matches('"').to_string())
    };

    extended.or_else(plain).and_then(|name| sanitize(&name))
}

/// Keep only the final path component so a header can never point elsewhere.
fn sanitize(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}

fn from_path(url: &str) -> ResolvedName {
    let Some(segment) = last_segment(url) else {
        return ResolvedName::new(DEFAULT_BASE, DEFAULT_EXTENSION);
    };

    match segment.rfind('.') {
        Some(idx) => {
            let base = match &segment[..idx] {
                "" => DEFAULT_BASE,
                base => base,
            };
            let extension = match &segment[idx..] {
                "." => DEFAULT_EXTENSION,
                extension => extension,
            };
            ResolvedName::new(base, extension)
        }
        None => ResolvedName::new(DEFAULT_BASE, DEFAULT_EXTENSION),
    }
}

fn stem(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(idx) if idx > 0 => &segment[..idx],
        _ => segment,
    }
}

fn last_segment(url: &str) -> Option<String> {
    let raw = match Url::parse(url) {
        Ok(parsed) => parsed.path_segments()?.next_back()?.to_string(),
        Err(_) => {
            let path = url.split(['?', '#']).next()?;
            path.rsplit('/').next()?.to_string()
        }
    };
    let decoded = percent_decode_str(&raw).decode_utf8_lossy().into_owned();
    sanitize(&decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn disposition_keeps_last_component() {
        let h = headers(&[(
            "Content-Disposition",
            "attachment; filename=\"application/report.pdf\"",
        )]);
        let name = resolve_filename(&h, "http://x/download");
        assert_eq!(name.file_name(), "report.pdf");
        assert_eq!(name.extension, ".pdf");
    }

    #[test]
    fn disposition_prefers_extended_filename() {
        let h = headers(&[(
            "content-disposition",
            "attachment; filename=\"fallback.bin\"; filename*=UTF-8''r%C3%A9sum%C3%A9.txt",
        )]);
        assert_eq!(resolve_filename(&h, "http://x/").file_name(), "résumé.txt");
    }

    #[test]
    fn disposition_wins_over_content_type() {
        let h = headers(&[
            ("Content-Type", "application/zip"),
            ("Content-Disposition", "attachment; filename=data.csv"),
        ]);
        assert_eq!(resolve_filename(&h, "http://x/a").file_name(), "data.csv");
    }

    #[test]
    fn disposition_without_filename_falls_through() {
        let h = headers(&[("Content-Disposition", "inline")]);
        assert_eq!(resolve_filename(&h, "http://x/a/song.mp3").file_name(), "song.mp3");
    }

    #[test]
    fn content_type_maps_extension() {
        let h = headers(&[("Content-Type", "application/pdf; charset=binary")]);
        assert_eq!(
            resolve_filename(&h, "http://x/files/report?id=7").file_name(),
            "report.pdf"
        );
    }

    #[test]
    fn content_type_without_url_stem_uses_default_base() {
        let h = headers(&[("Content-Type", "image/png")]);
        assert_eq!(resolve_filename(&h, "http://x/").file_name(), "Unknown.png");
    }

    #[test]
    fn generic_content_type_falls_through_to_path() {
        let h = headers(&[("Content-Type", "application/octet-stream")]);
        assert_eq!(
            resolve_filename(&h, "http://x/a/b/file.tar.gz").file_name(),
            "file.tar.gz"
        );
    }

    #[test]
    fn path_splits_at_last_dot() {
        let name = resolve_filename(&Headers::default(), "http://x/a/b/file.tar.gz");
        assert_eq!(name.base, "file.tar");
        assert_eq!(name.extension, ".gz");
        assert_eq!(name.file_name(), "file.tar.gz");
    }

    #[test]
    fn path_without_dot_uses_defaults() {
        let name = resolve_filename(&Headers::default(), "http://x/a/b/noext");
        assert_eq!(name.file_name(), "Unknown.unk");
    }

    #[test]
    fn dotfile_gets_default_base() {
        let name = resolve_filename(&Headers::default(), "http://x/.bashrc");
        assert_eq!(name.file_name(), "Unknown.bashrc");
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        let name = resolve_filename(&Headers::default(), "https://x/dl/app.tar.xz?token=1#top");
        assert_eq!(name.file_name(), "app.tar.xz");
    }

    #[test]
    fn unparsable_url_still_resolves() {
        let name = resolve_filename(&Headers::default(), "not a url/with/thing.iso");
        assert_eq!(name.file_name(), "thing.iso");
    }

    #[test]
    fn percent_encoded_segment_is_decoded() {
        let name = resolve_filename(&Headers::default(), "http://x/my%20file.zip");
        assert_eq!(name.file_name(), "my file.zip");
    }
}
