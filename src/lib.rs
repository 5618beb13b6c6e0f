//! streamchat is a streaming chat-completion client for OpenAI-compatible
//! endpoints, DeepSeek by default.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns credential checks, configuration, the mock responder, the
//!   HTTP transport, SSE frame reassembly, and the completion orchestrator
//!   that ties them together behind a callback sink.
//! - [`api`] defines chat/model payloads sent to and read from the endpoint.
//! - [`cli`] is a small terminal front end (`say`, `chat`, `models`,
//!   `config`) built on the orchestrator.
//! - [`utils`] holds URL, auth-header, and logging helpers.
//!
//! The binary (`src/main.rs`) routes straight through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
