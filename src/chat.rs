//! Free-text chat about the current selection
//!
//! Goes straight to the chat-completion API with the client credential,
//! attaching web search results as an extra system message.

use std::sync::Arc;

use crate::backend::citations::CitationLookup;
use crate::backend::completions::ChatCompletion;
use crate::backend::extract;
use crate::backend::types::{pretty, ChatMessage, Citation, ProductSummary, Role};
use crate::catalog::CatalogStore;
use crate::pipeline::RoutineResult;
use crate::selection::SelectionStore;

pub const MISSING_KEY: &str = "Missing OpenAI API key. Set OPENAI_API_KEY to enable chat.";
pub const NO_RESPONSE: &str = "(no response)";
pub const THINKING: &str = "Thinking...";

pub const CHAT_SYSTEM_PROMPT: &str =
    "You are a helpful beauty assistant. Use selected products where appropriate and format answers in Markdown.";

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Markdown answer with sources
    Answer(RoutineResult),
    /// Plain status or error text
    Notice(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub reply: Reply,
}

/// Conversation shown in the chat window
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn push_user(&mut self, text: &str) {
        self.turns.push(Turn {
            role: Role::User,
            reply: Reply::Notice(text.to_string()),
        });
    }

    pub fn push_assistant(&mut self, reply: Reply) {
        self.turns.push(Turn {
            role: Role::Assistant,
            reply,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

pub fn chat_messages(question: &str, products: &[ProductSummary], web: &[Citation]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CHAT_SYSTEM_PROMPT),
        ChatMessage::system(format!("Web search results: {}", pretty(web))),
        ChatMessage::user(format!(
            "Selected products (JSON): {}\n\nUser request: {}",
            pretty(products),
            question
        )),
    ]
}

pub struct ChatAssistant {
    catalog: Arc<CatalogStore>,
    completions: Arc<dyn ChatCompletion>,
    citations: Arc<dyn CitationLookup>,
    credential: Option<String>,
}

impl ChatAssistant {
    pub fn new(
        catalog: Arc<CatalogStore>,
        completions: Arc<dyn ChatCompletion>,
        citations: Arc<dyn CitationLookup>,
        credential: Option<String>,
    ) -> Self {
        Self {
            catalog,
            completions,
            citations,
            credential,
        }
    }

    /// Answer one question. Errors come back as a `Notice`.
    pub async fn ask(&self, question: &str, selection: &SelectionStore) -> Reply {
        let question = question.trim();
        let Some(api_key) = self.credential.as_deref() else {
            return Reply::Notice(MISSING_KEY.to_string());
        };

        let catalog = match self.catalog.load().await {
            Ok(catalog) => catalog,
            Err(e) => return Reply::Notice(format!("Error: {}", e)),
        };
        let products = selection.resolve(&catalog);

        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        let query = format!("{} {}", question, names.join(" ")).trim().to_string();
        let web = self.citations.search(&query).await;

        tracing::debug!("Chat question with {} products, {} sources", products.len(), web.len());
        match self
            .completions
            .complete(api_key, &chat_messages(question, &products, &web))
            .await
        {
            Ok(response) => {
                let text = extract::completion_choice(&response)
                    .unwrap_or(NO_RESPONSE)
                    .to_string();
                Reply::Answer(RoutineResult { text, citations: web })
            }
            Err(e) => Reply::Notice(format!("Error: {}", e)),
        }
    }
}
