//! Response header helpers: content types, HTTP dates and entity tags.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::key::TileKey;

/// Etag timestamps wrap every 48 hours.
const ETAG_EPOCH_SECS: f64 = 3600.0 * 48.0;

/// Resolves a Content-Type from a format extension.
///
/// Unknown extensions fall back to `text/plain`.
pub fn content_type(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "json" | "geojson" | "topojson" => "application/json",
        "mvt" | "pbf" => "application/x-protobuf",
        _ => "text/plain",
    }
}

/// Formats a timestamp as an RFC 7231 IMF-fixdate, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Entity tag for a file-backed tile.
///
/// Combines the file mtime (scaled, modulo 48 hours) with the last three
/// path segments, so tiles with identical mtimes still get distinct tags.
pub fn etag_for_file(mtime: SystemTime, path: &Path) -> String {
    let secs = mtime
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let stamp = (100.0 * (secs % ETAG_EPOCH_SECS)).round() as u64;
    let tail: String = path
        .iter()
        .rev()
        .take(3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|part| part.to_string_lossy().into_owned())
        .collect();
    format!("{stamp}{tail}")
}

/// Entity tag for a generator-backed tile: upstream modification timestamp
/// concatenated with the tile coordinates.
pub fn etag_for_generated(modified: SystemTime, key: TileKey) -> String {
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{secs}{}{}{}", key.zoom, key.col, key.row)
}

/// Content-identity entity tag: truncated SHA-256 of the body bytes.
///
/// Used for proxy tiles, which have no upstream timestamp to draw from.
pub fn etag_for_bytes(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_content_type_known_extensions() {
        assert_eq!(content_type("png"), "image/png");
        assert_eq!(content_type("jpg"), "image/jpeg");
        assert_eq!(content_type("JPEG"), "image/jpeg");
        assert_eq!(content_type("tif"), "image/tiff");
        assert_eq!(content_type("geojson"), "application/json");
        assert_eq!(content_type("topojson"), "application/json");
        assert_eq!(content_type("pbf"), "application/x-protobuf");
        assert_eq!(content_type("mvt"), "application/x-protobuf");
    }

    #[test]
    fn test_content_type_unknown_is_text_plain() {
        assert_eq!(content_type("dds"), "text/plain");
        assert_eq!(content_type(""), "text/plain");
    }

    #[test]
    fn test_http_date_format() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_etag_for_file_includes_path_tail() {
        let time = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let etag = etag_for_file(time, Path::new("/tiles/12/654/1583.png"));
        assert!(etag.ends_with("126541583.png"));
        // 1_000_000 % 172800 = 136000; * 100
        assert!(etag.starts_with("13600000"));
    }

    #[test]
    fn test_etag_for_file_short_path() {
        let time = UNIX_EPOCH + Duration::from_secs(60);
        let etag = etag_for_file(time, Path::new("tile.png"));
        assert!(etag.ends_with("tile.png"));
    }

    #[test]
    fn test_etag_for_file_changes_with_mtime() {
        let path = Path::new("/tiles/1/2/3.png");
        let a = etag_for_file(UNIX_EPOCH + Duration::from_secs(100), path);
        let b = etag_for_file(UNIX_EPOCH + Duration::from_secs(101), path);
        assert_ne!(a, b);
    }

    #[test]
    fn test_etag_for_generated() {
        let time = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let etag = etag_for_generated(time, TileKey::new(12, 654, 1583));
        assert_eq!(etag, "1700000000126541583");
    }

    #[test]
    fn test_etag_for_bytes_is_stable_and_distinct() {
        let a = etag_for_bytes(b"tile body");
        let b = etag_for_bytes(b"tile body");
        let c = etag_for_bytes(b"other body");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
