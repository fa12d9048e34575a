//! Request validation
//!
//! The download core trusts its input, so everything a client sends is checked
//! here first: the URL must be an absolute http(s) URL on an allowed host and free
//! of markup, and the format must be one the downloader knows.

use crate::error::{Error, Result};
use crate::types::{DownloadRequest, MediaFormat};
use url::Url;

/// Characters that never belong in a media URL a client may submit
const MARKUP_CHARS: &[char] = &['<', '>', '"', '\'', '`', '{', '}', '|', '\\', '^'];

/// Build a [`DownloadRequest`] from raw query values
///
/// `allowed_hosts` entries match the URL's host exactly or as a parent domain
/// (`youtube.com` accepts `www.youtube.com` and `m.youtube.com`).
pub fn validate_request(
    url: Option<&str>,
    format: Option<&str>,
    allowed_hosts: &[String],
) -> Result<DownloadRequest> {
    let raw = url.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(Error::InvalidRequest("missing url".to_string()));
    }

    if raw
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || MARKUP_CHARS.contains(&c))
    {
        return Err(Error::InvalidRequest(
            "url contains forbidden characters".to_string(),
        ));
    }

    let parsed =
        Url::parse(raw).map_err(|e| Error::InvalidRequest(format!("invalid url: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidRequest(format!(
            "unsupported url scheme: {}",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .ok_or_else(|| Error::InvalidRequest("url has no host".to_string()))?;

    if !is_allowed_host(&host, allowed_hosts) {
        return Err(Error::InvalidRequest(format!("host {} is not allowed", host)));
    }

    let format = format
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| Error::InvalidRequest("missing format".to_string()))?
        .parse::<MediaFormat>()
        .map_err(Error::InvalidRequest)?;

    Ok(DownloadRequest::new(parsed.as_str(), format))
}

fn is_allowed_host(host: &str, allowed_hosts: &[String]) -> bool {
    allowed_hosts.iter().any(|allowed| {
        let allowed = allowed.trim().trim_end_matches('.').to_ascii_lowercase();
        !allowed.is_empty()
            && (host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec!["youtube.com".to_string(), "youtu.be".to_string()]
    }

    fn rejection(url: Option<&str>, format: Option<&str>) -> String {
        match validate_request(url, format, &hosts()) {
            Err(Error::InvalidRequest(message)) => message,
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_allowed_host_and_subdomain() {
        let request = validate_request(
            Some("https://www.youtube.com/watch?v=abc"),
            Some("mp4"),
            &hosts(),
        )
        .unwrap();
        assert_eq!(request.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(request.format, MediaFormat::Video);

        let request = validate_request(Some("https://youtu.be/abc"), Some("audio"), &hosts()).unwrap();
        assert_eq!(request.format, MediaFormat::Audio);
    }

    #[test]
    fn test_host_matching_is_not_a_plain_suffix_match() {
        assert!(rejection(Some("https://notyoutube.com/watch?v=abc"), Some("mp4")).contains("not allowed"));
        assert!(rejection(Some("https://youtube.com.evil.org/x"), Some("mp4")).contains("not allowed"));
    }

    #[test]
    fn test_rejects_missing_or_malformed_url() {
        assert_eq!(rejection(None, Some("mp4")), "missing url");
        assert_eq!(rejection(Some("   "), Some("mp4")), "missing url");
        assert!(rejection(Some("youtube.com/watch"), Some("mp4")).starts_with("invalid url"));
        assert!(rejection(Some("ftp://youtube.com/x"), Some("mp4")).contains("scheme"));
    }

    #[test]
    fn test_rejects_markup() {
        assert!(
            rejection(
                Some("https://youtube.com/watch?v=<script>alert(1)</script>"),
                Some("mp4")
            )
            .contains("forbidden")
        );
        assert!(rejection(Some("https://youtube.com/a b"), Some("mp4")).contains("forbidden"));
    }

    #[test]
    fn test_rejects_missing_or_unknown_format() {
        assert_eq!(
            rejection(Some("https://youtu.be/abc"), None),
            "missing format"
        );
        assert!(rejection(Some("https://youtu.be/abc"), Some("flac")).contains("unknown format"));
    }
}
