//! The entry point the UI calls.
//!
//! [`CompletionOrchestrator::run`] validates the conversation, chooses the
//! mock or live path, and spawns a task that reports back through a
//! [`CompletionSink`]. Each run is tagged with a request token; starting a new
//! run (or calling [`CompletionOrchestrator::cancel`]) retires the previous
//! token, and every sink call checks its token under the gate lock, so once
//! `run` returns nothing from an older request can reach the sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ChatMessage;
use crate::core::chat_stream::{FrameStream, StreamFrame};
use crate::core::config::{ChatConfig, Settings};
use crate::core::credential::{Credential, CredentialSummary};
use crate::core::error::{summarize_error_body, CompletionError};
use crate::core::message::{prepare_submission, Message};
use crate::core::mock::MockResponder;
use crate::core::transport::TransportClient;

const LOGGED_PAYLOAD_CHARS: usize = 200;

/// Receiver of one request's output. `on_delta` fires zero or more times,
/// then exactly one of `on_done` / `on_error`, unless the request is
/// superseded first, in which case nothing further fires.
///
/// Calls are made while the orchestrator's gate lock is held, so a sink must
/// not call back into the orchestrator.
pub trait CompletionSink: Send + 'static {
    fn on_delta(&mut self, text: &str);
    fn on_done(&mut self);
    fn on_error(&mut self, error: CompletionError);
}

#[derive(Clone, Debug, PartialEq)]
pub enum CompletionEvent {
    Delta(String),
    Done,
    Error(CompletionError),
}

impl CompletionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CompletionEvent::Delta(_))
    }
}

/// Forwards a request's output over a channel. The sender is dropped when
/// the request ends, so the receiver yields `None` after the terminal event.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CompletionEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CompletionSink for ChannelSink {
    fn on_delta(&mut self, text: &str) {
        let _ = self.tx.send(CompletionEvent::Delta(text.to_string()));
    }

    fn on_done(&mut self) {
        let _ = self.tx.send(CompletionEvent::Done);
    }

    fn on_error(&mut self, error: CompletionError) {
        let _ = self.tx.send(CompletionEvent::Error(error));
    }
}

/// Adapts three closures to [`CompletionSink`].
pub struct CallbackSink<D, F, E> {
    on_delta: D,
    on_done: F,
    on_error: E,
}

impl<D, F, E> CallbackSink<D, F, E>
where
    D: FnMut(&str) + Send + 'static,
    F: FnMut() + Send + 'static,
    E: FnMut(CompletionError) + Send + 'static,
{
    pub fn new(on_delta: D, on_done: F, on_error: E) -> Self {
        Self {
            on_delta,
            on_done,
            on_error,
        }
    }
}

impl<D, F, E> CompletionSink for CallbackSink<D, F, E>
where
    D: FnMut(&str) + Send + 'static,
    F: FnMut() + Send + 'static,
    E: FnMut(CompletionError) + Send + 'static,
{
    fn on_delta(&mut self, text: &str) {
        (self.on_delta)(text)
    }

    fn on_done(&mut self) {
        (self.on_done)()
    }

    fn on_error(&mut self, error: CompletionError) {
        (self.on_error)(error)
    }
}

/// Holds the token of the request allowed to deliver.
#[derive(Debug, Default)]
struct RequestGate {
    current: Mutex<u64>,
}

impl RequestGate {
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(&self) -> u64 {
        let mut current = self.lock();
        *current += 1;
        *current
    }

    fn current(&self) -> u64 {
        *self.lock()
    }

    /// Run `deliver` only if `token` is still current, holding the lock
    /// throughout so a concurrent `advance` cannot slip in between.
    fn deliver_if_current(&self, token: u64, deliver: impl FnOnce()) -> bool {
        let current = self.lock();
        if *current != token {
            return false;
        }
        deliver();
        true
    }
}

/// Text delivered so far for one request.
#[derive(Debug, Default)]
pub struct ContentBuffer {
    text: String,
}

impl ContentBuffer {
    pub fn push(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Per-request state, moved into the task that serves the request.
struct Delivery<S> {
    gate: Arc<RequestGate>,
    token: u64,
    sink: S,
    buffer: ContentBuffer,
}

impl<S: CompletionSink> Delivery<S> {
    /// Returns false once the request has been superseded.
    fn delta(&mut self, text: &str) -> bool {
        let sink = &mut self.sink;
        let delivered = self
            .gate
            .deliver_if_current(self.token, || sink.on_delta(text));
        if delivered {
            self.buffer.push(text);
        }
        delivered
    }

    /// Consumes the delivery, so a request can end at most once.
    fn finish(mut self, outcome: Result<(), CompletionError>) {
        let token = self.token;
        let chars = self.buffer.char_count();
        let sink = &mut self.sink;
        let delivered = match outcome {
            Ok(()) => self.gate.deliver_if_current(token, || sink.on_done()),
            Err(err) => {
                warn!(request = token, error = %err, "completion failed");
                self.gate.deliver_if_current(token, || sink.on_error(err))
            }
        };
        if delivered {
            debug!(request = token, chars, "completion finished");
        } else {
            debug!(request = token, chars, "dropping result of superseded request");
        }
    }
}

pub struct CompletionOrchestrator {
    transport: TransportClient,
    mock: MockResponder,
    credential: Option<Credential>,
    force_mock: bool,
    system_prompt: Option<String>,
    gate: Arc<RequestGate>,
    cancel_token: Option<CancellationToken>,
}

impl CompletionOrchestrator {
    pub fn new(
        transport: TransportClient,
        mock: MockResponder,
        credential: Option<Credential>,
        force_mock: bool,
    ) -> Self {
        let orchestrator = Self {
            transport,
            mock,
            credential,
            force_mock,
            system_prompt: None,
            gate: Arc::new(RequestGate::default()),
            cancel_token: None,
        };

        if !force_mock && orchestrator.uses_mock() {
            warn!(
                credential = %orchestrator.credential_summary(),
                "no usable API key configured; responses will come from mock mode"
            );
        }
        info!(
            base_url = orchestrator.transport.base_url(),
            mock_mode = orchestrator.uses_mock(),
            credential = %orchestrator.credential_summary(),
            "completion client initialized"
        );
        orchestrator
    }

    pub fn from_settings(client: reqwest::Client, settings: &Settings) -> Self {
        Self::new(
            TransportClient::new(client, settings.base_url.clone()),
            MockResponder::new(settings.mock_interval),
            settings.credential.clone(),
            settings.mock_mode,
        )
        .with_system_prompt(settings.system_prompt.clone())
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    /// True when requests are answered locally: mock mode is forced or the
    /// configured credential is unusable.
    pub fn uses_mock(&self) -> bool {
        self.force_mock || !self.credential.as_ref().is_some_and(Credential::is_usable)
    }

    /// Token of the most recent request; zero before the first run.
    pub fn current_request(&self) -> u64 {
        self.gate.current()
    }

    fn credential_summary(&self) -> CredentialSummary {
        self.credential
            .as_ref()
            .map(Credential::summary)
            .unwrap_or_else(CredentialSummary::none)
    }

    /// Abandon the in-flight request, if any. Its sink receives nothing more.
    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
            let retired = self.gate.advance();
            debug!(request = retired - 1, "cancelled in-flight request");
        }
    }

    /// Start a completion for `conversation` and return its request token.
    ///
    /// Supersedes any request still in flight. Output arrives on `sink` from
    /// a spawned task, so this must be called inside a Tokio runtime. An
    /// invalid conversation is reported to `sink` before this returns.
    pub fn run<S: CompletionSink>(
        &mut self,
        conversation: &[Message],
        config: &ChatConfig,
        sink: S,
    ) -> u64 {
        self.cancel();
        let token = self.gate.advance();
        let delivery = Delivery {
            gate: Arc::clone(&self.gate),
            token,
            sink,
            buffer: ContentBuffer::default(),
        };

        let Some(messages) = prepare_submission(conversation, self.system_prompt.as_deref())
        else {
            delivery.finish(Err(CompletionError::InvalidConversation));
            return token;
        };

        let cancel_token = CancellationToken::new();
        self.cancel_token = Some(cancel_token.clone());

        if self.uses_mock() {
            let reply = self.mock.reply_for(conversation);
            info!(request = token, mode = "mock", "starting completion");
            tokio::spawn(serve_mock(
                self.mock.clone(),
                reply,
                cancel_token,
                delivery,
            ));
        } else {
            let credential = self
                .credential
                .as_ref()
                .map(|credential| credential.expose().to_string())
                .unwrap_or_default();
            info!(
                request = token,
                mode = "live",
                model = %config.model,
                messages = messages.len(),
                "starting completion"
            );
            tokio::spawn(serve_live(
                self.transport.clone(),
                messages,
                config.clone(),
                credential,
                cancel_token,
                delivery,
            ));
        }

        token
    }
}

async fn serve_mock<S: CompletionSink>(
    mock: MockResponder,
    reply: &'static str,
    cancel_token: CancellationToken,
    mut delivery: Delivery<S>,
) {
    let characters = mock.character_stream(reply);
    tokio::pin!(characters);

    tokio::select! {
        _ = cancel_token.cancelled() => return,
        _ = async {
            while let Some(character) = characters.next().await {
                if !delivery.delta(&character) {
                    break;
                }
            }
        } => {}
    }

    delivery.finish(Ok(()));
}

async fn serve_live<S: CompletionSink>(
    transport: TransportClient,
    messages: Vec<ChatMessage>,
    config: ChatConfig,
    credential: String,
    cancel_token: CancellationToken,
    mut delivery: Delivery<S>,
) {
    let outcome = tokio::select! {
        _ = cancel_token.cancelled() => return,
        outcome = stream_live(&transport, messages, &config, &credential, &mut delivery) => outcome,
    };

    delivery.finish(outcome);
}

async fn stream_live<S: CompletionSink>(
    transport: &TransportClient,
    messages: Vec<ChatMessage>,
    config: &ChatConfig,
    credential: &str,
    delivery: &mut Delivery<S>,
) -> Result<(), CompletionError> {
    let body = transport.request(messages, config, credential).await?;
    let mut frames = FrameStream::new(body);

    while let Some(frame) = frames.next_frame().await {
        match frame? {
            StreamFrame::ContentDelta(text) => {
                if !delivery.delta(&text) {
                    break;
                }
            }
            StreamFrame::Terminator => break,
            StreamFrame::Unparseable(raw) => log_unparseable(delivery.token, &raw),
        }
    }
    Ok(())
}

fn log_unparseable(token: u64, raw: &str) {
    let payload: String = raw.chars().take(LOGGED_PAYLOAD_CHARS).collect();
    match summarize_error_body(raw).filter(|summary| summary != raw.trim()) {
        Some(summary) => warn!(
            request = token,
            summary = %summary,
            "provider reported an error inside the stream; skipping frame"
        ),
        None => warn!(request = token, payload = %payload, "skipping unparseable stream frame"),
    }
}
