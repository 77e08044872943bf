//! Outbound HTTP: the generateRoutine proxy, the chat-completion API and
//! citation search

pub mod api;
pub mod citations;
pub mod completions;
pub mod extract;
pub mod types;
