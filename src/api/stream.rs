//! Streaming delta decoder
//!
//! Converts a chunked HTTP response body into an ordered sequence of text
//! deltas plus a running accumulated string, tolerating the three upstream
//! wire shapes this client understands:
//!
//! - OpenAI-style chunks: `choices[0].delta.content`
//! - Anthropic-style events: `type == "content_block_delta"` with
//!   `delta.text`
//! - Generic records: the first non-empty of the top-level `output`,
//!   `result`, `text`, or `content` fields
//!
//! The transport framing is newline-delimited `data: <json>` lines. A
//! literal `[DONE]` sentinel is a no-op; the stream terminates only when the
//! underlying byte stream closes. Malformed JSON lines are logged and
//! skipped — a bad line never aborts the stream. Transport-level read errors
//! propagate to the caller and are not retried.
//!
//! The decoder holds only local state, so any number of independent
//! invocations may run concurrently.

use crate::error::{KanavaError, Result};
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;

/// Delta object inside an OpenAI-style choice
#[derive(Debug, Deserialize, Default)]
pub(crate) struct OpenAiDelta {
    #[serde(default)]
    pub(crate) content: Option<String>,
}

/// One choice of an OpenAI-style streaming chunk
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiChoice {
    #[serde(default)]
    pub(crate) delta: OpenAiDelta,
}

/// OpenAI-style streaming chunk
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiChunk {
    pub(crate) choices: Vec<OpenAiChoice>,
}

/// Delta object of an Anthropic-style stream event
#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicDelta {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

/// Anthropic-style stream event
#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicEvent {
    #[serde(rename = "type")]
    pub(crate) event_type: String,
    #[serde(default)]
    pub(crate) delta: Option<AnthropicDelta>,
}

/// Classified shape of one streamed JSON record
///
/// Classification happens before extraction, with fixed precedence:
/// OpenAI first, then Anthropic, then the generic fallback.
#[derive(Debug)]
pub(crate) enum StreamPayload {
    /// Record with a `choices` array
    OpenAi(OpenAiChunk),
    /// Record with `type == "content_block_delta"`
    Anthropic(AnthropicEvent),
    /// Anything else; extraction probes well-known top-level fields
    Generic(serde_json::Value),
}

impl StreamPayload {
    /// Classify a parsed JSON record by its shape
    pub(crate) fn classify(value: serde_json::Value) -> Self {
        if value.get("choices").map_or(false, |c| c.is_array()) {
            if let Ok(chunk) = serde_json::from_value::<OpenAiChunk>(value.clone()) {
                return Self::OpenAi(chunk);
            }
        }

        if value.get("type").and_then(|t| t.as_str()) == Some("content_block_delta") {
            if let Ok(event) = serde_json::from_value::<AnthropicEvent>(value.clone()) {
                return Self::Anthropic(event);
            }
        }

        Self::Generic(value)
    }

    /// Extract the text delta carried by this record, if any
    pub(crate) fn into_delta(self) -> Option<String> {
        match self {
            Self::OpenAi(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content),
            Self::Anthropic(event) => event.delta.and_then(|delta| delta.text),
            Self::Generic(value) => ["output", "result", "text", "content"]
                .iter()
                .find_map(|field| {
                    value
                        .get(field)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                }),
        }
    }
}

/// Decode a chunked byte stream into text deltas
///
/// Reads the stream to exhaustion, invoking `on_delta` with
/// `(delta, accumulated)` for every extracted non-empty delta, in strict
/// arrival order. The accumulated value passed to the nth callback is always
/// the concatenation of deltas 1..n. Returns the final accumulated text once
/// the stream closes.
///
/// Partial multi-byte UTF-8 sequences and partial lines are carried across
/// chunk boundaries, so chunking never splits or drops a delta.
///
/// # Arguments
///
/// * `byte_stream` - The raw response body as a stream of byte chunks
/// * `on_delta` - Callback invoked per decoded delta with the delta and the
///   accumulated text so far
///
/// # Errors
///
/// Returns an error when a chunk-level read fails; mid-stream decode
/// failures (malformed lines) are skipped, not errors.
pub async fn decode_stream<S, E, F>(byte_stream: S, mut on_delta: F) -> Result<String>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::fmt::Display,
    F: FnMut(&str, &str),
{
    use futures::StreamExt;

    let mut utf8_carry: Vec<u8> = Vec::new();
    let mut line_buffer = String::new();
    let mut accumulated = String::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(err) => {
                return Err(KanavaError::Api(format!("Stream read failed: {}", err)).into());
            }
        };

        let text = decode_utf8_chunk(&mut utf8_carry, &chunk);
        line_buffer.push_str(&text);

        // Hand complete lines to the extractor; keep the partial tail.
        while let Some(pos) = line_buffer.find('\n') {
            let line: String = line_buffer.drain(..=pos).collect();
            process_line(&line, &mut accumulated, &mut on_delta);
        }
    }

    // A final line may arrive without a trailing newline.
    if !line_buffer.is_empty() {
        let line = std::mem::take(&mut line_buffer);
        process_line(&line, &mut accumulated, &mut on_delta);
    }

    Ok(accumulated)
}

/// Decode a response into text deltas
///
/// Thin wrapper over [`decode_stream`] that takes the HTTP response
/// directly. Fails with [`KanavaError::StreamUnavailable`] when the response
/// demonstrably carries no readable body (an explicit zero-length body on a
/// streaming request).
///
/// # Arguments
///
/// * `response` - An established (2xx) HTTP response
/// * `on_delta` - Callback invoked per decoded delta
pub async fn stream_completion<F>(response: reqwest::Response, on_delta: F) -> Result<String>
where
    F: FnMut(&str, &str),
{
    if response.content_length() == Some(0) {
        return Err(KanavaError::StreamUnavailable.into());
    }

    decode_stream(response.bytes_stream(), on_delta).await
}

/// Decode one chunk of bytes as UTF-8, carrying partial sequences
///
/// Appends the chunk to `carry`, decodes as much as possible, and leaves any
/// incomplete trailing multi-byte sequence in `carry` for the next chunk.
/// Invalid byte sequences are dropped and decoding continues.
fn decode_utf8_chunk(carry: &mut Vec<u8>, chunk: &[u8]) -> String {
    carry.extend_from_slice(chunk);

    let mut decoded = String::new();
    let mut start = 0;

    loop {
        match std::str::from_utf8(&carry[start..]) {
            Ok(valid) => {
                decoded.push_str(valid);
                carry.clear();
                return decoded;
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                decoded.push_str(
                    std::str::from_utf8(&carry[start..start + valid_up_to]).unwrap_or(""),
                );

                match err.error_len() {
                    Some(invalid_len) => {
                        tracing::debug!("Dropping {} invalid UTF-8 bytes", invalid_len);
                        start += valid_up_to + invalid_len;
                    }
                    None => {
                        // Incomplete trailing sequence; keep for the next read.
                        let tail = carry[start + valid_up_to..].to_vec();
                        *carry = tail;
                        return decoded;
                    }
                }
            }
        }
    }
}

/// Process one framing line: strip the `data: ` prefix, parse, extract
fn process_line<F>(line: &str, accumulated: &mut String, on_delta: &mut F)
where
    F: FnMut(&str, &str),
{
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let data = match line.strip_prefix("data: ") {
        Some(data) => data,
        None => return,
    };

    // Sentinel, not a terminator: stream closure ends the stream.
    if data == "[DONE]" {
        return;
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("Skipping malformed stream line: {}", err);
            return;
        }
    };

    if let Some(delta) = StreamPayload::classify(value).into_delta() {
        if !delta.is_empty() {
            accumulated.push_str(&delta);
            on_delta(&delta, accumulated);
        }
    }
}
