//! Progress extraction from worker output
//!
//! The worker writes human-readable progress lines to stdout. Pipe reads do not
//! respect line boundaries, so [`ProgressExtractor`] buffers bytes until a line is
//! complete and only then parses it. `\n` and `\r` both end a line, because the
//! worker redraws its progress line with a carriage return when not told otherwise.
//!
//! Three surface forms are recognized:
//!
//! ```text
//! [download]  42.5% of 10.00MiB at 1.20MiB/s ETA 00:07
//!  42.5% of ~10.00MiB
//! [download] 100%
//! ```
//!
//! A line that looks like progress but does not hold a finite percentage in
//! `0..=100` is skipped.

use crate::types::ProgressEvent;
use futures::{Stream, StreamExt, stream};
use regex::Regex;
use std::sync::LazyLock;

// Patterns are literals; compiling them cannot fail at runtime.
#[allow(clippy::expect_used)]
static PROGRESS_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // [download]  42.5% of 10.00MiB at 1.20MiB/s
        Regex::new(r"\[download\]\s+([^\s%]+)%\s+of\s+~?\s*\S+(?:\s+at\s+\S+)?")
            .expect("valid regex"),
        // 42.5% of 10.00MiB
        Regex::new(r"^\s*([^\s%]+)%\s+of\s+~?\s*\S+").expect("valid regex"),
        // [download] 42.5%
        Regex::new(r"\[download\]\s+([^\s%]+)%").expect("valid regex"),
    ]
});

/// Parse one complete line of worker output
///
/// Returns the percentage if the line is a download progress report.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let captured = PROGRESS_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(line))?
        .get(1)?
        .as_str();

    match captured.parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=100.0).contains(&value) => Some(value),
        _ => {
            tracing::trace!(line, "Skipping unparseable progress line");
            None
        }
    }
}

/// Incremental line splitter and progress parser for one worker invocation
///
/// Holds only the unterminated tail of the output seen so far. Create a fresh
/// extractor for every invocation.
#[derive(Debug, Default)]
pub struct ProgressExtractor {
    pending: Vec<u8>,
}

impl ProgressExtractor {
    /// Create an extractor with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the events for every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ProgressEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.pending[start..end]);
            if let Some(percentage) = parse_progress_line(&line) {
                events.push(ProgressEvent::new(percentage));
            }
            start = end + 1;
        }
        self.pending.drain(..start);

        events
    }

    /// Bytes of an unterminated line currently buffered
    ///
    /// Dropping the extractor discards them unparsed.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Lazily turn a stream of raw stdout chunks into progress events
///
/// Events come out in the order their lines were completed. When `chunks` ends, an
/// unterminated trailing line is discarded.
pub fn extract_progress<S>(chunks: S) -> impl Stream<Item = ProgressEvent>
where
    S: Stream<Item = Vec<u8>>,
{
    chunks
        .scan(ProgressExtractor::new(), |extractor, chunk| {
            futures::future::ready(Some(stream::iter(extractor.push(&chunk))))
        })
        .flatten()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_progress_line() {
        assert_eq!(
            parse_progress_line("[download]  42.5% of 10.00MiB at 1.2MiB/s"),
            Some(42.5)
        );
        assert_eq!(
            parse_progress_line(
                "[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)"
            ),
            Some(6.2)
        );
    }

    #[test]
    fn test_parse_bare_percentage_of_size() {
        assert_eq!(parse_progress_line(" 92.5% of 3.10GiB"), Some(92.5));
        assert_eq!(parse_progress_line("12% of ~1.00MiB"), Some(12.0));
    }

    #[test]
    fn test_parse_bracketed_bare_percentage() {
        assert_eq!(parse_progress_line("[download] 100%"), Some(100.0));
        assert_eq!(parse_progress_line("[download] 100.0% of 5.00MiB in 00:03"), Some(100.0));
    }

    #[test]
    fn test_parse_rejects_non_progress_lines() {
        assert_eq!(parse_progress_line("[info] Writing video subtitles"), None);
        assert_eq!(
            parse_progress_line("[download] Destination: downloads/1.mp4"),
            None
        );
        assert_eq!(parse_progress_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn test_parse_skips_anomalies() {
        assert_eq!(parse_progress_line("[download] Unknown% of ~10.00MiB"), None);
        assert_eq!(parse_progress_line("[download] NaN%"), None);
        assert_eq!(parse_progress_line("[download] 150.0% of 1.00MiB"), None);
    }

    #[test]
    fn test_line_split_mid_percentage() {
        let mut extractor = ProgressExtractor::new();

        assert!(extractor.push(b"[download]  4").is_empty());
        assert_eq!(extractor.pending_len(), 13);

        let events = extractor.push(b"2.5% of 10.00MiB at 1.2MiB/s\n");
        assert_eq!(events, vec![ProgressEvent::new(42.5)]);
        assert_eq!(extractor.pending_len(), 0);
    }

    #[test]
    fn test_multiple_lines_per_chunk() {
        let mut extractor = ProgressExtractor::new();
        let events = extractor.push(
            b"[youtube] abc: Downloading webpage\n[download]   1.0% of 2.00MiB\n[download]  50.0% of 2.00MiB\n[download] 10",
        );

        assert_eq!(
            events,
            vec![ProgressEvent::new(1.0), ProgressEvent::new(50.0)]
        );
        assert_eq!(extractor.pending_len(), "[download] 10".len());
    }

    #[test]
    fn test_carriage_return_terminates_lines() {
        let mut extractor = ProgressExtractor::new();
        let events = extractor.push(b"\r[download]  10.0% of 1MiB\r[download]  20.0% of 1MiB\r\n");

        assert_eq!(
            events,
            vec![ProgressEvent::new(10.0), ProgressEvent::new(20.0)]
        );
    }

    #[test]
    fn test_regression_is_not_clamped() {
        let mut extractor = ProgressExtractor::new();
        let events = extractor.push(b"[download]  80.0% of 1MiB\n[download]   5.0% of 3MiB\n");

        assert_eq!(
            events,
            vec![ProgressEvent::new(80.0), ProgressEvent::new(5.0)]
        );
    }

    #[test]
    fn test_split_multibyte_character() {
        let line = "[download]  33.0% of 1MiB at 1MiB/s ✓\n".as_bytes();
        let split = line.len() - 3; // inside the 3-byte check mark
        let mut extractor = ProgressExtractor::new();

        assert!(extractor.push(&line[..split]).is_empty());
        assert_eq!(extractor.push(&line[split..]), vec![ProgressEvent::new(33.0)]);
    }

    #[tokio::test]
    async fn test_stream_yields_single_event_for_split_line() {
        let chunks = stream::iter(vec![
            b"[download]  42".to_vec(),
            b".5% of 10.00MiB at 1.2MiB/s\n".to_vec(),
        ]);

        let events: Vec<ProgressEvent> = extract_progress(chunks).collect().await;
        assert_eq!(events, vec![ProgressEvent::new(42.5)]);
    }

    #[tokio::test]
    async fn test_stream_discards_unterminated_tail() {
        let chunks = stream::iter(vec![
            b"[download]  10.0% of 1MiB\n".to_vec(),
            b"[download]  99.0% of 1MiB".to_vec(),
        ]);

        let events: Vec<ProgressEvent> = extract_progress(chunks).collect().await;
        assert_eq!(events, vec![ProgressEvent::new(10.0)]);
    }

    #[tokio::test]
    async fn test_stream_of_nothing() {
        let chunks = stream::iter(Vec::<Vec<u8>>::new());
        let events: Vec<ProgressEvent> = extract_progress(chunks).collect().await;
        assert!(events.is_empty());
    }
}
