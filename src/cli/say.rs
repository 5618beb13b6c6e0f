//! One-shot "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::config::{ChatConfig, Settings};
use crate::core::error::CompletionError;
use crate::core::message::Message;
use crate::core::orchestrator::{ChannelSink, CompletionEvent, CompletionOrchestrator};

/// Why a streamed reply did not finish.
#[derive(Debug)]
pub enum ReplyError {
    Completion(CompletionError),
    Output(io::Error),
}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyError::Completion(err) => write!(f, "{err}"),
            ReplyError::Output(err) => write!(f, "Failed to write output: {err}"),
        }
    }
}

impl Error for ReplyError {}

impl From<io::Error> for ReplyError {
    fn from(err: io::Error) -> Self {
        ReplyError::Output(err)
    }
}

/// Run one completion and copy each delta to `out` as it arrives. Returns the
/// full reply text.
pub async fn stream_reply<W: Write>(
    orchestrator: &mut CompletionOrchestrator,
    conversation: &[Message],
    config: &ChatConfig,
    out: &mut W,
) -> Result<String, ReplyError> {
    let (sink, mut rx) = ChannelSink::new();
    orchestrator.run(conversation, config, sink);

    let mut reply = String::new();
    while let Some(event) = rx.recv().await {
        match event {
            CompletionEvent::Delta(content) => {
                reply.push_str(&content);
                write!(out, "{content}")?;
                out.flush()?;
            }
            CompletionEvent::Done => {
                writeln!(out)?;
            }
            CompletionEvent::Error(err) => {
                if !reply.is_empty() {
                    writeln!(out)?;
                }
                return Err(ReplyError::Completion(err));
            }
        }
    }
    Ok(reply)
}

pub(crate) fn report_reply_error(err: &ReplyError) {
    eprintln!("❌ Error: {err}");
    if let ReplyError::Completion(completion) = err {
        if completion.is_auth_failure() {
            eprintln!();
            eprintln!("💡 Quick fixes:");
            eprintln!("  • export DEEPSEEK_API_KEY=\"sk-...\"");
            eprintln!("  • streamchat config set-key sk-...");
        }
    }
}

pub async fn run_say(settings: &Settings, prompt: Vec<String>) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: streamchat say <prompt>");
        std::process::exit(1);
    }

    let mut orchestrator = CompletionOrchestrator::from_settings(reqwest::Client::new(), settings);
    let conversation = vec![Message::user(prompt)];

    let mut stdout = io::stdout();
    if let Err(err) = stream_reply(&mut orchestrator, &conversation, &settings.chat, &mut stdout).await
    {
        report_reply_error(&err);
        std::process::exit(1);
    }

    Ok(())
}
