//! Offline responder used when no usable API key is configured or mock mode
//! is forced. It picks a canned reply from the last user message and plays
//! it back one character per tick so the UI sees realistic streaming.

use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::core::config::defaults::DEFAULT_MOCK_INTERVAL_MS;
use crate::core::message::{last_user_content, Message};

const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey", "你好", "嗨"];
const INTRODUCTION_KEYWORDS: &[&str] = &["who are you", "introduce", "介绍", "是谁", "功能"];
const CODE_KEYWORDS: &[&str] = &["code", "program", "function", "代码", "编程", "程序"];

const GREETING_REPLY: &str = "Hello! I'm the AI assistant. I'm running in mock mode, so my answers are canned. \
Configure a valid API key to talk to the real model. What can I help you with?";

const INTRODUCTION_REPLY: &str = "I'm a DeepSeek-powered assistant, currently in mock mode. In this mode my replies \
are preset rather than generated by the API. With a valid API key I can answer questions, write code, and explain concepts.";

const CODE_REPLY: &str = "Here is a small Rust function:\n\n```rust\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n\n\
fn main() {\n    println!(\"{}\", add(5, 3)); // prints 8\n}\n```\n\n\
I'm in mock mode and can't write anything more elaborate. Configure a valid API key for real programming help.";

const DEFAULT_REPLY: &str = "Thanks for your question. I'm running in mock mode (no valid API key was found), so I can \
only give preset answers. Set DEEPSEEK_API_KEY to get real responses. Anything else?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockTopic {
    Greeting,
    Introduction,
    Code,
    Fallback,
}

impl MockTopic {
    pub fn reply(self) -> &'static str {
        match self {
            MockTopic::Greeting => GREETING_REPLY,
            MockTopic::Introduction => INTRODUCTION_REPLY,
            MockTopic::Code => CODE_REPLY,
            MockTopic::Fallback => DEFAULT_REPLY,
        }
    }
}

/// Whole-word match for ASCII keywords so "hi" does not fire on "this";
/// substring match for CJK keywords, which have no word boundaries.
fn mentions(text: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return text.contains(keyword);
    }
    text.match_indices(keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

pub fn classify(message: &str) -> MockTopic {
    let lowered = message.to_lowercase();
    let any = |keywords: &[&str]| keywords.iter().any(|keyword| mentions(&lowered, keyword));

    if any(GREETING_KEYWORDS) {
        MockTopic::Greeting
    } else if any(INTRODUCTION_KEYWORDS) {
        MockTopic::Introduction
    } else if any(CODE_KEYWORDS) {
        MockTopic::Code
    } else {
        MockTopic::Fallback
    }
}

#[derive(Clone, Debug)]
pub struct MockResponder {
    interval: Duration,
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MOCK_INTERVAL_MS))
    }
}

impl MockResponder {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reply_for(&self, conversation: &[Message]) -> &'static str {
        classify(last_user_content(conversation).unwrap_or_default()).reply()
    }

    /// The reply as a stream of single characters, one per interval tick.
    /// The first character arrives after one interval.
    pub fn character_stream(&self, reply: &str) -> impl Stream<Item = String> + Send + 'static {
        let chars: Vec<char> = reply.chars().collect();
        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        stream::unfold(
            (chars.into_iter(), ticker),
            |(mut chars, mut ticker)| async move {
                let next = chars.next()?;
                ticker.tick().await;
                Some((next.to_string(), (chars, ticker)))
            },
        )
    }
}
