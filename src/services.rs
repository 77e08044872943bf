//! Wires settings into the catalog store, pipeline and chat assistant

use std::sync::Arc;

use crate::backend::api::BackendClient;
use crate::backend::citations::InstantAnswerClient;
use crate::backend::completions::CompletionClient;
use crate::catalog::{source, CatalogStore};
use crate::chat::ChatAssistant;
use crate::config::{self, Settings};
use crate::pipeline::Pipeline;

/// Everything the window and the headless commands share
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<CatalogStore>,
    pub pipeline: Arc<Pipeline>,
    pub assistant: Arc<ChatAssistant>,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> Self {
        let client = settings.http_client();
        let credential = config::credential();
        if credential.is_none() {
            tracing::info!(
                "{} not set; direct completion fallback and chat are disabled",
                config::CREDENTIAL_ENV
            );
        }

        let catalog = Arc::new(CatalogStore::new(source::from_location(
            client.clone(),
            &settings.catalog,
        )));
        let completions = Arc::new(CompletionClient::from_settings(client.clone(), settings));
        let citations = Arc::new(InstantAnswerClient::new(client.clone(), &settings.search_url));

        let pipeline = Arc::new(Pipeline::new(
            catalog.clone(),
            Box::new(BackendClient::new(client, &settings.backend_url)),
            completions.clone(),
            citations.clone(),
            credential.clone(),
        ));
        let assistant = Arc::new(ChatAssistant::new(
            catalog.clone(),
            completions,
            citations,
            credential,
        ));

        Self {
            catalog,
            pipeline,
            assistant,
        }
    }
}
