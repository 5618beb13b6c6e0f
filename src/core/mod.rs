pub mod chat_stream;
pub mod config;
pub mod credential;
pub mod error;
pub mod keyring;
pub mod message;
pub mod mock;
pub mod orchestrator;
pub mod transport;
