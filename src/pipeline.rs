//! Routine generation pipeline
//!
//! Worker-first: the selection is posted to the generateRoutine proxy, and
//! only when that yields no usable text does the pipeline call the
//! chat-completion API directly with the client credential.
//!
//! ```text
//! Idle -> Requesting -> Succeeded
//!                    -> FallbackRequesting -> Succeeded | Failed
//! ```
//!
//! The trigger control is held through a [`TriggerGuard`] for the whole run,
//! so it is re-enabled and relabelled on every exit path.

use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::backend::api::RoutineBackend;
use crate::backend::citations::CitationLookup;
use crate::backend::completions::ChatCompletion;
use crate::backend::extract;
use crate::backend::types::{pretty, ChatMessage, Citation, GenerateRequest, ProductSummary};
use crate::catalog::{CatalogStore, ProductId};
use crate::error::{BackendError, RoutineError};
use crate::markdown;
use crate::selection::SelectionStore;
use crate::ui::markup;

pub const NOTHING_SELECTED: &str = "Please select products to generate a routine.";
pub const GENERATING: &str = "Generating your routine, this may take a few seconds...";
pub const BUSY_LABEL: &str = "Generating...";

pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful beauty assistant. Given selected products, provide Morning and Evening routines formatted in Markdown with headings and numbered steps.";

const DEFAULT_QUERY: &str = "L'Oréal products";
const QUERY_SUFFIX: &str = "routine L'Oréal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Requesting,
    FallbackRequesting,
    Succeeded,
    Failed,
}

/// Which path produced the routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Backend proxy; names the extractor that matched
    Backend(&'static str),
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineResult {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutineOutcome {
    NothingSelected,
    /// Another run already holds the trigger
    Busy,
    Succeeded { result: RoutineResult, route: Route },
    Failed(RoutineError),
}

impl RoutineOutcome {
    pub fn state(&self) -> PipelineState {
        match self {
            RoutineOutcome::NothingSelected | RoutineOutcome::Busy => PipelineState::Idle,
            RoutineOutcome::Succeeded { .. } => PipelineState::Succeeded,
            RoutineOutcome::Failed(_) => PipelineState::Failed,
        }
    }

    /// User-facing text (markdown on success)
    pub fn display_text(&self) -> String {
        match self {
            RoutineOutcome::NothingSelected => NOTHING_SELECTED.to_string(),
            RoutineOutcome::Busy => GENERATING.to_string(),
            RoutineOutcome::Succeeded { result, .. } => result.text.clone(),
            RoutineOutcome::Failed(e) => e.to_string(),
        }
    }

    pub fn citations(&self) -> &[Citation] {
        match self {
            RoutineOutcome::Succeeded { result, .. } => &result.citations,
            _ => &[],
        }
    }

    /// HTML for the chat window
    pub fn to_html(&self) -> String {
        match self {
            RoutineOutcome::Succeeded { result, .. } => format!(
                "<div class=\"ai-response\">{}</div>{}",
                markdown::render_html(&result.text),
                markup::sources(self.citations())
            ),
            RoutineOutcome::Failed(e @ RoutineError::MissingCredential { .. }) => {
                format!("<pre>{}</pre>", markdown::escape_html(&e.to_string()))
            }
            other => format!("<p>{}</p>", markdown::escape_html(&other.display_text())),
        }
    }
}

/// Enabled state and label of the button that starts a run
#[derive(Debug)]
pub struct TriggerControl {
    busy: AtomicBool,
    label: Mutex<String>,
}

impl TriggerControl {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            busy: AtomicBool::new(false),
            label: Mutex::new(label.to_string()),
        })
    }

    /// Disable the control and swap its label; `None` if already disabled
    pub fn try_begin(self: &Arc<Self>, busy_label: &str) -> Option<TriggerGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let previous = std::mem::replace(&mut *self.lock_label(), busy_label.to_string());
        Some(TriggerGuard {
            control: Arc::clone(self),
            previous,
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.busy.load(Ordering::SeqCst)
    }

    pub fn label(&self) -> String {
        self.lock_label().clone()
    }

    fn lock_label(&self) -> std::sync::MutexGuard<'_, String> {
        self.label.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Restores the trigger on drop
#[derive(Debug)]
pub struct TriggerGuard {
    control: Arc<TriggerControl>,
    previous: String,
}

impl Drop for TriggerGuard {
    fn drop(&mut self) {
        *self.control.lock_label() = std::mem::take(&mut self.previous);
        self.control.busy.store(false, Ordering::SeqCst);
    }
}

/// Search query for the citation lookup
pub fn citation_query(products: &[ProductSummary]) -> String {
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    let joined = names.join(" ");
    let base = if joined.is_empty() { DEFAULT_QUERY } else { joined.as_str() };
    format!("{} {}", base, QUERY_SUFFIX)
}

pub fn fallback_messages(products: &[ProductSummary]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(FALLBACK_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Selected products: {}\n\nPlease generate the routine.",
            pretty(products)
        )),
    ]
}

pub struct Pipeline {
    catalog: Arc<CatalogStore>,
    backend: Box<dyn RoutineBackend>,
    completions: Arc<dyn ChatCompletion>,
    citations: Arc<dyn CitationLookup>,
    credential: Option<String>,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<CatalogStore>,
        backend: Box<dyn RoutineBackend>,
        completions: Arc<dyn ChatCompletion>,
        citations: Arc<dyn CitationLookup>,
        credential: Option<String>,
    ) -> Self {
        Self {
            catalog,
            backend,
            completions,
            citations,
            credential,
        }
    }

    /// One full run. Never returns an error; failures become `Failed`.
    pub async fn run(&self, trigger: &Arc<TriggerControl>, selection: &SelectionStore) -> RoutineOutcome {
        if selection.is_empty() {
            return RoutineOutcome::NothingSelected;
        }
        let Some(guard) = trigger.try_begin(BUSY_LABEL) else {
            tracing::debug!("Routine generation already in flight; ignoring trigger");
            return RoutineOutcome::Busy;
        };
        self.execute(guard, selection).await
    }

    /// Run with a trigger already taken by the caller. The guard is held
    /// until the outcome is ready (or the future is dropped).
    pub async fn execute(&self, guard: TriggerGuard, selection: &SelectionStore) -> RoutineOutcome {
        let _guard = guard;
        if selection.is_empty() {
            return RoutineOutcome::NothingSelected;
        }

        let run_id = Uuid::new_v4();
        let outcome = match self.generate(run_id, selection.list()).await {
            Ok((result, route)) => RoutineOutcome::Succeeded { result, route },
            Err(e) => RoutineOutcome::Failed(e),
        };
        enter(run_id, outcome.state());
        outcome
    }

    async fn generate(
        &self,
        run_id: Uuid,
        ids: &[ProductId],
    ) -> Result<(RoutineResult, Route), RoutineError> {
        enter(run_id, PipelineState::Requesting);
        let catalog = self.catalog.load().await?;
        let products: Vec<ProductSummary> = ids
            .iter()
            .filter_map(|&id| catalog.find(id))
            .map(ProductSummary::from)
            .collect();

        let citations = self.citations.search(&citation_query(&products)).await;
        let request = GenerateRequest {
            products,
            citations: citations.clone(),
        };

        let response = match self.backend.generate(&request).await {
            Ok(body) => body,
            Err(e) => json!({ "error": e.to_string() }),
        };

        if let Some((extractor, text)) = extract::routine_text(&response) {
            tracing::info!(%run_id, extractor, "Routine received from backend");
            return Ok((RoutineResult { text, citations }, Route::Backend(extractor)));
        }

        let reason = extract::error_indicator(&response)
            .map(BackendError::Reported)
            .unwrap_or(BackendError::Empty);
        tracing::warn!(%run_id, "Backend did not produce a routine: {}", reason);
        enter(run_id, PipelineState::FallbackRequesting);

        let Some(api_key) = self.credential.as_deref() else {
            return Err(RoutineError::MissingCredential {
                backend_response: pretty(&response),
            });
        };

        let completion = self
            .completions
            .complete(api_key, &fallback_messages(&request.products))
            .await?;
        let text = extract::completion_choice(&completion)
            .map(str::to_string)
            .unwrap_or_else(|| pretty(&completion));
        Ok((RoutineResult { text, citations }, Route::Fallback))
    }
}

fn enter(run_id: Uuid, state: PipelineState) {
    tracing::info!(%run_id, ?state, "Routine pipeline state");
}
