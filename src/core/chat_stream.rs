//! Reassembly of the streamed completion body into frames.
//!
//! The body is newline-delimited server-sent events. Reads from the network
//! land at arbitrary byte offsets, so [`FrameDecoder`] keeps the unterminated
//! tail of every read and only ever parses complete lines. [`FrameStream`]
//! drives the decoder from a byte stream and hands frames out one at a time.

use std::collections::VecDeque;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use memchr::memchr;

use crate::api::ChatResponse;
use crate::core::error::CompletionError;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_PAYLOAD: &str = "[DONE]";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamFrame {
    ContentDelta(String),
    Terminator,
    Unparseable(String),
}

impl StreamFrame {
    pub fn is_terminator(&self) -> bool {
        matches!(self, StreamFrame::Terminator)
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX).map(str::trim_start)
}

fn parse_data_payload(payload: &str) -> Option<StreamFrame> {
    if payload == DONE_PAYLOAD {
        return Some(StreamFrame::Terminator);
    }

    if payload.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .first_delta_content()
            .filter(|content| !content.is_empty())
            .map(|content| StreamFrame::ContentDelta(content.to_string())),
        Err(_) => Some(StreamFrame::Unparseable(payload.to_string())),
    }
}

/// Parse one complete line (without its `\n`). Non-data lines yield nothing.
fn parse_line(line: &[u8]) -> Option<StreamFrame> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match std::str::from_utf8(line) {
        Ok(text) => extract_data_payload(text.trim()).and_then(parse_data_payload),
        Err(_) => {
            let lossy = String::from_utf8_lossy(line);
            extract_data_payload(lossy.trim())
                .map(|payload| StreamFrame::Unparseable(payload.to_string()))
        }
    }
}

/// Incremental line splitter and frame parser.
///
/// Holds raw bytes rather than text so a multi-byte character split across
/// two reads is decoded only once the whole line has arrived.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    terminated: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a `[DONE]` frame has been produced; later input is ignored.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Bytes held back waiting for their line terminator.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one read's worth of bytes, appending every frame from the lines
    /// it completes.
    pub fn push(&mut self, chunk: &[u8], frames: &mut VecDeque<StreamFrame>) {
        if self.terminated {
            return;
        }
        self.buffer.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(offset) = memchr(b'\n', &self.buffer[consumed..]) {
            let line_end = consumed + offset;
            let frame = parse_line(&self.buffer[consumed..line_end]);
            consumed = line_end + 1;

            if let Some(frame) = frame {
                let done = frame.is_terminator();
                frames.push_back(frame);
                if done {
                    self.terminated = true;
                    self.buffer.clear();
                    return;
                }
            }
        }
        self.buffer.drain(..consumed);
    }

    /// End of input: a non-empty unterminated tail is parsed as a last line.
    pub fn finish(&mut self, frames: &mut VecDeque<StreamFrame>) {
        if self.terminated {
            return;
        }
        let tail = std::mem::take(&mut self.buffer);
        if let Some(frame) = parse_line(&tail) {
            if frame.is_terminator() {
                self.terminated = true;
            }
            frames.push_back(frame);
        }
    }
}

/// Decode a complete body in one go; handy for tests and benchmarks.
pub fn decode_all(body: &[u8]) -> Vec<StreamFrame> {
    let mut decoder = FrameDecoder::new();
    let mut frames = VecDeque::new();
    decoder.push(body, &mut frames);
    decoder.finish(&mut frames);
    frames.into()
}

/// Lazy, finite sequence of frames read from a response body.
///
/// The sequence always ends with a [`StreamFrame::Terminator`] (from the wire
/// or synthesized at end of input) or a single transport error. It cannot be
/// restarted; a fresh request is needed for that.
pub struct FrameStream<B> {
    inner: BoxStream<'static, Result<B, CompletionError>>,
    decoder: FrameDecoder,
    pending: VecDeque<StreamFrame>,
    finished: bool,
}

impl<B> FrameStream<B>
where
    B: AsRef<[u8]> + Send + 'static,
{
    pub fn new<S>(body: S) -> Self
    where
        S: futures_util::Stream<Item = Result<B, CompletionError>> + Send + 'static,
    {
        Self {
            inner: body.boxed(),
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    pub async fn next_frame(&mut self) -> Option<Result<StreamFrame, CompletionError>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                if frame.is_terminator() {
                    self.finished = true;
                    self.pending.clear();
                }
                return Some(Ok(frame));
            }

            if self.finished {
                return None;
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.decoder.push(chunk.as_ref(), &mut self.pending),
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                None => {
                    self.decoder.finish(&mut self.pending);
                    self.pending.push_back(StreamFrame::Terminator);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::delta_line;
    use futures_util::stream;

    fn deltas(frames: &[StreamFrame]) -> String {
        frames
            .iter()
            .filter_map(|frame| match frame {
                StreamFrame::ContentDelta(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    async fn collect_frames(chunks: Vec<Vec<u8>>) -> Vec<StreamFrame> {
        let mut frames = FrameStream::new(stream::iter(chunks.into_iter().map(Ok)));
        let mut out = Vec::new();
        while let Some(frame) = frames.next_frame().await {
            out.push(frame.expect("no transport error"));
        }
        out
    }

    #[test]
    fn content_line_yields_delta() {
        let frames = decode_all(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n");
        assert_eq!(frames, vec![StreamFrame::ContentDelta("Hi".to_string())]);
    }

    #[test]
    fn done_line_terminates_and_ignores_the_rest() {
        let body = format!("{}data: [DONE]\n{}", delta_line("a"), delta_line("late"));
        let frames = decode_all(body.as_bytes());
        assert_eq!(
            frames,
            vec![
                StreamFrame::ContentDelta("a".to_string()),
                StreamFrame::Terminator
            ]
        );
    }

    #[test]
    fn spacing_variants_and_crlf_are_accepted() {
        let body = "data:{\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n: keep-alive\r\nevent: message\r\n\r\ndata:[DONE]\r\n";
        let frames = decode_all(body.as_bytes());
        assert_eq!(
            frames,
            vec![
                StreamFrame::ContentDelta("x".to_string()),
                StreamFrame::Terminator
            ]
        );
    }

    #[test]
    fn malformed_frame_between_valid_frames_is_isolated() {
        let body = format!(
            "{}data: {{\"choices\":[{{\"delta\":\n{}",
            delta_line("before"),
            delta_line("after")
        );
        let frames = decode_all(body.as_bytes());
        assert_eq!(
            frames,
            vec![
                StreamFrame::ContentDelta("before".to_string()),
                StreamFrame::Unparseable("{\"choices\":[{\"delta\":".to_string()),
                StreamFrame::ContentDelta("after".to_string()),
            ]
        );
    }

    #[test]
    fn empty_content_and_empty_choices_are_skipped() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\ndata: {\"choices\":[]}\ndata: \n";
        assert!(decode_all(body.as_bytes()).is_empty());
    }

    #[test]
    fn provider_error_object_is_unparseable_not_fatal() {
        let body = "data: {\"error\":{\"message\":\"overloaded\"}}\n";
        assert_eq!(
            decode_all(body.as_bytes()),
            vec![StreamFrame::Unparseable(
                "{\"error\":{\"message\":\"overloaded\"}}".to_string()
            )]
        );
    }

    #[test]
    fn partial_line_waits_for_its_terminator() {
        let mut decoder = FrameDecoder::new();
        let mut frames = VecDeque::new();
        let line = delta_line("split");
        let (head, tail) = line.as_bytes().split_at(17);

        decoder.push(head, &mut frames);
        assert!(frames.is_empty());
        assert_eq!(decoder.pending_len(), head.len());

        decoder.push(tail, &mut frames);
        assert_eq!(frames, vec![StreamFrame::ContentDelta("split".to_string())]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn multibyte_text_split_across_reads_survives() {
        let line = delta_line("你好，世界");
        let bytes = line.as_bytes();
        let mut decoder = FrameDecoder::new();
        let mut frames = VecDeque::new();
        for byte in bytes {
            decoder.push(std::slice::from_ref(byte), &mut frames);
        }
        assert_eq!(
            frames,
            vec![StreamFrame::ContentDelta("你好，世界".to_string())]
        );
    }

    #[test]
    fn invalid_utf8_data_line_is_unparseable() {
        let mut body = b"data: {\"choices\":[{\"delta\":{\"content\":\"".to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(b"\"}}]}\n");
        body.extend_from_slice(delta_line("ok").as_bytes());

        let frames = decode_all(&body);
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], StreamFrame::Unparseable(_)));
        assert_eq!(frames[1], StreamFrame::ContentDelta("ok".to_string()));
    }

    #[test]
    fn unterminated_tail_is_parsed_at_end_of_input() {
        let body = delta_line("last");
        let frames = decode_all(body.trim_end().as_bytes());
        assert_eq!(frames, vec![StreamFrame::ContentDelta("last".to_string())]);
    }

    #[test]
    fn chunk_boundaries_do_not_change_the_text() {
        let mut body = String::new();
        for word in ["The ", "quick ", "brown ", "狐狸 ", "jumps", "\n\nover"] {
            body.push_str(&delta_line(word));
            body.push('\n');
        }
        body.push_str("data: {broken\n");
        body.push_str(&delta_line(" the lazy dog"));
        body.push_str("data: [DONE]\n");
        let bytes = body.as_bytes();
        let expected = deltas(&decode_all(bytes));
        assert_eq!(expected, "The quick brown 狐狸 jumps\n\nover the lazy dog");

        for chunk_size in [1, 2, 3, 5, 7, 16, 64, bytes.len()] {
            let mut decoder = FrameDecoder::new();
            let mut frames = VecDeque::new();
            for chunk in bytes.chunks(chunk_size) {
                decoder.push(chunk, &mut frames);
            }
            decoder.finish(&mut frames);
            let frames: Vec<_> = frames.into();
            assert_eq!(deltas(&frames), expected, "chunk size {chunk_size}");
            assert_eq!(frames.last(), Some(&StreamFrame::Terminator));
        }
    }

    #[tokio::test]
    async fn frame_stream_synthesizes_terminator_at_end_of_input() {
        let frames = collect_frames(vec![delta_line("a").into_bytes(), b"data: {\"choi".to_vec()])
            .await;
        assert_eq!(
            frames,
            vec![
                StreamFrame::ContentDelta("a".to_string()),
                StreamFrame::Unparseable("{\"choi".to_string()),
                StreamFrame::Terminator,
            ]
        );
    }

    #[tokio::test]
    async fn frame_stream_stops_at_done_without_reading_further() {
        let chunks = vec![
            format!("{}data: [DONE]\n", delta_line("x")).into_bytes(),
            delta_line("never").into_bytes(),
        ];
        let frames = collect_frames(chunks).await;
        assert_eq!(
            frames,
            vec![
                StreamFrame::ContentDelta("x".to_string()),
                StreamFrame::Terminator
            ]
        );
    }

    #[tokio::test]
    async fn frame_stream_surfaces_read_errors_once() {
        let chunks: Vec<Result<Vec<u8>, CompletionError>> = vec![
            Ok(delta_line("a").into_bytes()),
            Err(CompletionError::network("connection reset")),
            Ok(delta_line("b").into_bytes()),
        ];
        let mut frames = FrameStream::new(stream::iter(chunks));

        assert_eq!(
            frames.next_frame().await,
            Some(Ok(StreamFrame::ContentDelta("a".to_string())))
        );
        assert_eq!(
            frames.next_frame().await,
            Some(Err(CompletionError::network("connection reset")))
        );
        assert_eq!(frames.next_frame().await, None);
    }
}
