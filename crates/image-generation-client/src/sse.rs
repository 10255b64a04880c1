//! Server-Sent Events framing for the image edit stream and mapping of events to [`PartialResult`]s.
//!
//! # Entry points
//!
//! - **[`SseDecoder`]** – Splits raw bytes into events (blank-line separated blocks).
//! - **[`partial_results`]** – Turns a byte stream into a stream of `Result<PartialResult, GenerationError>`.

use std::collections::VecDeque;
use std::fmt::Display;

use futures::stream::{BoxStream, Stream, StreamExt};
use serde::Deserialize;

use crate::error::GenerationError;
use crate::types::PartialResult;

const EVENT_PARTIAL: &str = "image_edit.partial_image";
const EVENT_COMPLETED: &str = "image_edit.completed";
const EVENT_ERROR: &str = "error";

/// One decoded SSE block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE decoder; feed it chunks as they arrive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));
        let mut events = Vec::new();
        while let Some(pos) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_block(&block[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_block(&rest)
    }
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data_lines = Vec::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }
    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}

#[derive(Debug, Deserialize)]
struct ImageEditEvent {
    #[serde(rename = "type")]
    kind: Option<String>,
    b64_json: Option<String>,
    partial_image_index: Option<usize>,
    error: Option<ApiErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) message: Option<String>,
    pub(crate) code: Option<String>,
}

/// Maps one SSE event to a result. `Ok(None)` for events we do not care about (keep-alives, `[DONE]`).
pub fn event_to_result(
    event: &SseEvent,
    position: usize,
) -> Result<Option<PartialResult>, GenerationError> {
    if event.data.is_empty() || event.data == "[DONE]" {
        return Ok(None);
    }
    let parsed: ImageEditEvent = serde_json::from_str(&event.data)
        .map_err(|e| GenerationError::MalformedResponse(format!("invalid event JSON: {}", e)))?;
    let kind = parsed
        .kind
        .clone()
        .or_else(|| event.event.clone())
        .unwrap_or_default();

    match kind.as_str() {
        EVENT_PARTIAL | EVENT_COMPLETED => {
            let is_final = kind == EVENT_COMPLETED;
            let b64 = parsed.b64_json.as_deref().ok_or_else(|| {
                GenerationError::MalformedResponse(format!("{} event without b64_json", kind))
            })?;
            let index = if is_final {
                position
            } else {
                parsed.partial_image_index.unwrap_or(position)
            };
            PartialResult::from_b64(b64, index, is_final).map(Some)
        }
        EVENT_ERROR => {
            let message = parsed
                .error
                .and_then(|e| e.message.or(e.code))
                .or(parsed.message)
                .unwrap_or_else(|| "unknown error".to_string());
            Err(GenerationError::RemoteRejected(message))
        }
        _ => Ok(None),
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<PartialResult, GenerationError>>,
    position: usize,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn enqueue(&mut self, event: SseEvent) {
        match event_to_result(&event, self.position) {
            Ok(Some(result)) => {
                self.position += 1;
                self.pending.push_back(Ok(result));
            }
            Ok(None) => {}
            Err(e) => self.pending.push_back(Err(e)),
        }
    }
}

/// **Entry point.** Decodes a raw SSE byte stream into partial results, in arrival order.
///
/// A transport error ends the stream with [`GenerationError::Connection`]; an undecodable event
/// yields [`GenerationError::MalformedResponse`] and decoding continues with the next event.
pub fn partial_results<S, B, E>(bytes: S) -> BoxStream<'static, Result<PartialResult, GenerationError>>
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        position: 0,
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in st.decoder.push(chunk.as_ref()) {
                        st.enqueue(event);
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending
                        .push_back(Err(GenerationError::Connection(e.to_string())));
                }
                None => {
                    st.finished = true;
                    if let Some(event) = st.decoder.finish() {
                        st.enqueue(event);
                    }
                }
            }
        }
    })
    .boxed()
}
