use tracing::{debug, info};

use super::http::HttpClient;
use crate::core::resolve_filename;
use crate::data::{Headers, Meta};
use crate::error::MetadataError;

/// Probe `url` for size, resumability and a save name without fetching the body.
///
/// A missing or non-numeric `Content-Length` is fatal: nothing can be planned
/// without a size. Transport failures are returned as is; retrying is up to
/// the caller.
pub async fn probe_metadata<C: HttpClient>(client: &C, url: &str) -> Result<Meta, MetadataError> {
    debug!(url, "probing metadata");

    let response = client
        .probe(url)
        .await
        .map_err(|e| MetadataError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })?;

    if !(200..300).contains(&response.status) {
        return Err(MetadataError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    let headers = response.headers;
    let raw = headers
        .first("content-length")
        .ok_or_else(|| MetadataError::MissingLength {
            url: url.to_string(),
        })?;
    let size = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| MetadataError::InvalidLength {
            url: url.to_string(),
            value: raw.to_string(),
        })?;

    let resumable = is_resumable(&headers);
    let name = resolve_filename(&headers, url).file_name();

    info!(url, size, resumable, name = %name, "probed metadata");

    Ok(Meta {
        size,
        name,
        resumable,
        headers,
    })
}

/// `Accept-Ranges` present and not `none`.
pub fn is_resumable(headers: &Headers) -> bool {
    headers
        .first("accept-ranges")
        .is_some_and(|value| !value.trim().eq_ignore_ascii_case("none"))
}
