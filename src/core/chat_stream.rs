use std::collections::VecDeque;
use std::fmt::Display;

use futures_util::stream::{self, Stream, StreamExt};
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::GenerateContentResponse;
use crate::core::session::{ChatError, FragmentStream};

/// Progress of a dispatched reply, tagged with its stream id on the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Outcome of one SSE line. `None` means the line carried nothing to emit.
fn handle_data_payload(payload: &str) -> Option<Result<String, ChatError>> {
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            return Some(Err(ChatError::transport(format!(
                "undecodable stream payload: {err}"
            ))))
        }
    };

    if value.get("error").is_some() {
        let code = value
            .pointer("/error/code")
            .and_then(serde_json::Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());
        return Some(Err(ChatError::transport(format_api_error(code, payload))));
    }

    match serde_json::from_value::<GenerateContentResponse>(value) {
        Ok(response) => response.text().map(Ok),
        Err(err) => Some(Err(ChatError::transport(format!(
            "unexpected stream payload: {err}"
        )))),
    }
}

fn process_sse_line(line: &str) -> Option<Result<String, ChatError>> {
    extract_data_payload(line).and_then(handle_data_payload)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// One-line description of an error body, prefixed with the HTTP status
/// when there is one.
pub(crate) fn format_api_error(status: Option<u16>, error_text: &str) -> String {
    let trimmed = error_text.trim();
    let detail = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => extract_error_summary(&value)
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| value.to_string()),
        Err(_) if trimmed.is_empty() => "<empty>".to_string(),
        Err(_) => trimmed.split_whitespace().collect::<Vec<_>>().join(" "),
    };

    match status {
        Some(code) => format!("HTTP {code}: {detail}"),
        None => detail,
    }
}

struct SseDecoder<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, ChatError>>,
    finished: bool,
}

impl<S> SseDecoder<S> {
    fn drain_lines(&mut self) {
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            self.take_line(newline_pos);
            self.buffer.drain(..=newline_pos);
        }
    }

    fn flush_tail(&mut self) {
        if !self.buffer.is_empty() {
            let len = self.buffer.len();
            self.take_line(len);
            self.buffer.clear();
        }
    }

    fn take_line(&mut self, end: usize) {
        match std::str::from_utf8(&self.buffer[..end]) {
            Ok(line) => {
                if let Some(item) = process_sse_line(line.trim()) {
                    self.pending.push_back(item);
                }
            }
            Err(err) => {
                warn!("Invalid UTF-8 in stream: {err}");
                self.pending.push_back(Err(ChatError::transport(format!(
                    "undecodable stream payload: {err}"
                ))));
            }
        }
    }
}

/// Decode a server-sent-event byte stream into reply fragments.
///
/// Partial responses without text are skipped. An in-band error payload,
/// an undecodable payload, or a failing byte stream yields one
/// `ChatError::Transport` and ends the stream.
pub fn sse_fragments<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, ChatError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let decoder = SseDecoder {
        inner: bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(item) = decoder.pending.pop_front() {
                if item.is_err() {
                    decoder.pending.clear();
                    decoder.finished = true;
                }
                return Some((item, decoder));
            }

            if decoder.finished {
                return None;
            }

            match decoder.inner.next().await {
                Some(Ok(chunk)) => {
                    decoder.buffer.extend_from_slice(chunk.as_ref());
                    decoder.drain_lines();
                }
                Some(Err(err)) => {
                    decoder.finished = true;
                    decoder.pending.clear();
                    let error = ChatError::transport(format!("stream interrupted: {err}"));
                    return Some((Err(error), decoder));
                }
                None => {
                    decoder.finished = true;
                    decoder.flush_tail();
                }
            }
        }
    })
}

/// Pumps dispatched replies into the channel the event loop drains.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Forward every fragment of `fragments` as `Chunk`, then exactly one
    /// `Error` or `End`. Nothing more is sent once `cancel_token` fires.
    pub fn spawn_stream(
        &self,
        stream_id: u64,
        cancel_token: CancellationToken,
        fragments: FragmentStream,
    ) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = forward_fragments(fragments, &tx_clone, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "reply stream cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn forward_fragments(
    mut fragments: FragmentStream,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => {
                if tx.send((StreamMessage::Chunk(fragment), stream_id)).is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
                return;
            }
        }
    }
    let _ = tx.send((StreamMessage::End, stream_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn chunked(chunks: &[&str]) -> impl Stream<Item = Result<Vec<u8>, Infallible>> + Unpin {
        let owned: Vec<Result<Vec<u8>, Infallible>> = chunks
            .iter()
            .map(|chunk| Ok(chunk.as_bytes().to_vec()))
            .collect();
        stream::iter(owned)
    }

    async fn decode(chunks: &[&str]) -> Vec<Result<String, ChatError>> {
        sse_fragments(chunked(chunks)).collect().await
    }

    #[test]
    fn process_sse_line_handles_spacing_variants() {
        let spaced = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#;
        let tight = r#"data:{"candidates":[{"content":{"parts":[{"text":"World"}]}}]}"#;

        assert_eq!(process_sse_line(spaced), Some(Ok("Hello".to_string())));
        assert_eq!(process_sse_line(tight), Some(Ok("World".to_string())));
        assert_eq!(process_sse_line("data: [DONE]"), None);
        assert_eq!(process_sse_line(": keep-alive"), None);
        assert_eq!(process_sse_line("event: message"), None);
    }

    #[test]
    fn process_sse_line_routes_stream_errors() {
        let line = r#"data: {"error":{"code":500,"message":"internal   server error","status":"INTERNAL"}}"#;
        assert_eq!(
            process_sse_line(line),
            Some(Err(ChatError::transport("HTTP 500: internal server error")))
        );

        let without_code = r#"data: {"error":{"message":"quota exhausted"}}"#;
        assert_eq!(
            process_sse_line(without_code),
            Some(Err(ChatError::transport("quota exhausted")))
        );
    }

    #[test]
    fn format_api_error_prefers_summary_and_status() {
        let raw = r#"{"error":{"code":403,"message":"API key not valid.","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(format_api_error(Some(403), raw), "HTTP 403: API key not valid.");
        assert_eq!(format_api_error(Some(502), "  "), "HTTP 502: <empty>");
        assert_eq!(
            format_api_error(None, "<html>bad\ngateway</html>"),
            "<html>bad gateway</html>"
        );
        assert_eq!(
            format_api_error(None, r#"{"status":"failed"}"#),
            r#"{"status":"failed"}"#
        );
    }

    #[tokio::test]
    async fn fragments_survive_arbitrary_chunk_boundaries() {
        let items = decode(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"te",
            "xt\":\"Hi\"}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":",
            "{\"parts\":[{\"text\":\" there\"}]}}]}\r\n\r\n",
        ])
        .await;
        assert_eq!(items, vec![Ok("Hi".to_string()), Ok(" there".to_string())]);
    }

    #[tokio::test]
    async fn responses_without_text_are_skipped() {
        let items = decode(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}\n\n",
            "data: {\"usageMetadata\":{\"totalTokenCount\":3}}\n\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\n\n",
        ])
        .await;
        assert_eq!(items, vec![Ok("Hi".to_string())]);
    }

    #[tokio::test]
    async fn final_line_without_newline_is_flushed() {
        let items = decode(&["data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"end\"}]}}]}"]).await;
        assert_eq!(items, vec![Ok("end".to_string())]);
    }

    #[tokio::test]
    async fn stream_ends_after_first_error() {
        let items = decode(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"par\"}]}}]}\n",
            "data: not json\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"never\"}]}}]}\n",
        ])
        .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("par".to_string()));
        assert!(matches!(items[1], Err(ChatError::Transport(_))));
    }

    #[tokio::test]
    async fn invalid_utf8_line_ends_the_stream_with_an_error() {
        let mut garbled = b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"".to_vec();
        garbled.extend_from_slice(&[0xff, 0xfe]);
        garbled.extend_from_slice(b"\"}]}}]}\n");

        let source = stream::iter(vec![
            Ok::<_, Infallible>(
                b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a\"}]}}]}\n".to_vec(),
            ),
            Ok(garbled),
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"c\"}]}}]}\n".to_vec()),
        ]);
        let items: Vec<_> = sse_fragments(source).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("a".to_string()));
        match &items[1] {
            Err(ChatError::Transport(message)) => {
                assert!(message.starts_with("undecodable stream payload"), "{message}")
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn byte_stream_failure_is_a_transport_error() {
        let source = stream::iter(vec![
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a\"}]}}]}\n".to_vec()),
            Err("connection reset"),
            Ok(b"data: ignored\n".to_vec()),
        ]);
        let items: Vec<_> = sse_fragments(source).collect().await;
        assert_eq!(
            items,
            vec![
                Ok("a".to_string()),
                Err(ChatError::transport("stream interrupted: connection reset"))
            ]
        );
    }

    #[tokio::test]
    async fn service_forwards_chunks_then_end() {
        let (service, mut rx) = ChatStreamService::new();
        let fragments = stream::iter(vec![Ok("Hi".to_string()), Ok(" there".to_string())]).boxed();
        service.spawn_stream(7, CancellationToken::new(), fragments);

        assert_eq!(rx.recv().await, Some((StreamMessage::Chunk("Hi".into()), 7)));
        assert_eq!(rx.recv().await, Some((StreamMessage::Chunk(" there".into()), 7)));
        assert_eq!(rx.recv().await, Some((StreamMessage::End, 7)));
    }

    #[tokio::test]
    async fn service_reports_errors_without_end() {
        let (service, mut rx) = ChatStreamService::new();
        let fragments = stream::iter(vec![Err(ChatError::transport("boom"))]).boxed();
        service.spawn_stream(3, CancellationToken::new(), fragments);

        assert_eq!(
            rx.recv().await,
            Some((StreamMessage::Error("transport error: boom".into()), 3))
        );
        drop(service);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn cancelled_service_sends_nothing() {
        let (service, mut rx) = ChatStreamService::new();
        let token = CancellationToken::new();
        token.cancel();
        service.spawn_stream(1, token, stream::pending().boxed());
        drop(service);

        assert_eq!(rx.recv().await, None);
    }
}
