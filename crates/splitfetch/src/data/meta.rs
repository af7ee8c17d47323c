use serde::{Deserialize, Serialize};

use super::Headers;

/// What a metadata probe learned about the remote resource.
///
/// Produced once per download and read-only afterwards. Serializable so a
/// caller can cache it and plan again later without re-probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Total size in bytes, from `Content-Length`.
    pub size: u64,
    /// Resolved file name.
    pub name: String,
    /// Whether the server accepts byte-range requests.
    pub resumable: bool,
    /// Raw response headers of the probe.
    pub headers: Headers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_a_json_cache() {
        let meta = Meta {
            size: 1024,
            name: "disk.iso".into(),
            resumable: true,
            headers: [("Accept-Ranges", "bytes")].into_iter().collect(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        let cached: Meta = serde_json::from_str(&json).unwrap();
        assert_eq!(cached, meta);
        assert_eq!(cached.headers.first("accept-ranges"), Some("bytes"));
    }
}
