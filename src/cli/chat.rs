//! Line-oriented chat over stdin. History lives only for the session.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::say::{report_reply_error, stream_reply};
use crate::core::config::Settings;
use crate::core::message::Message;
use crate::core::orchestrator::CompletionOrchestrator;

#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Empty,
    Exit,
    Clear,
    Help,
    Prompt(&'a str),
}

impl<'a> ChatInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => ChatInput::Empty,
            "/exit" | "/quit" => ChatInput::Exit,
            "/clear" => ChatInput::Clear,
            "/help" => ChatInput::Help,
            _ => ChatInput::Prompt(trimmed),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /clear   Forget the conversation so far");
    println!("  /help    Show this help");
    println!("  /exit    Leave (Ctrl+D also works)");
}

pub async fn run_chat(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let mut orchestrator = CompletionOrchestrator::from_settings(reqwest::Client::new(), settings);

    println!(
        "💬 streamchat · {} (temperature {})",
        settings.chat.model, settings.chat.temperature
    );
    if orchestrator.uses_mock() {
        println!("⚠️  Mock mode: replies are canned. Set DEEPSEEK_API_KEY for real answers.");
    }
    println!("Type /help for commands.");
    println!();

    let mut conversation: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match ChatInput::parse(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => break,
            ChatInput::Help => print_help(),
            ChatInput::Clear => {
                conversation.clear();
                println!("🧹 Conversation cleared.");
            }
            ChatInput::Prompt(prompt) => {
                conversation.push(Message::user(prompt));
                match stream_reply(&mut orchestrator, &conversation, &settings.chat, &mut stdout)
                    .await
                {
                    Ok(reply) => conversation.push(Message::assistant(reply)),
                    Err(err) => {
                        report_reply_error(&err);
                        conversation.pop();
                    }
                }
                debug!(turns = conversation.len(), "conversation updated");
            }
        }
    }

    Ok(())
}
