//! Core application state and Iced Application implementation
//!
//! Catalog browsing on one side, selection, routine output and chat on the
//! other. Every view is derived from `RoutineBuilder` on each frame, so the
//! card grid and the selection list are redrawn from the same store after
//! every mutation.

use iced::alignment::Horizontal;
use iced::keyboard::{self, key::Named, Key};
use iced::widget::{
    button, center, column, container, mouse_area, opaque, row, scrollable, stack, text,
    text_input, Column, Row, Space,
};
use iced::{Background, Border, Color, Element, Length, Padding, Subscription, Task, Theme};
use std::sync::Arc;

use crate::backend::types::Role;
use crate::catalog::{Catalog, ProductId};
use crate::chat::{self, ChatAssistant, Conversation, Reply};
use crate::error::CatalogLoadError;
use crate::pipeline::{self, Pipeline, RoutineOutcome, TriggerControl};
use crate::selection::{SelectionChanged, SelectionStore};
use crate::services::Services;
use crate::ui::view_model::{self, CardView, CategoryOption, ModalState};
use crate::ui::{markdown_view, search_bar, theme};

pub const GENERATE_LABEL: &str = "Generate Routine";
const GRID_COLUMNS: usize = 3;

// ============================================================================
// UI State Types
// ============================================================================

/// What the routine area currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Empty,
    Generating,
    Routine(RoutineOutcome),
}

// ============================================================================
// Application State
// ============================================================================

pub struct RoutineBuilder {
    catalog: Option<Result<Arc<Catalog>, CatalogLoadError>>,
    category: Option<CategoryOption>,
    search: String,
    selection: SelectionStore,
    modal: ModalState,
    trigger: Arc<TriggerControl>,
    pipeline: Arc<Pipeline>,
    assistant: Arc<ChatAssistant>,
    output: Output,
    conversation: Conversation,
    question: String,
    chat_pending: bool,
    rtl: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    CatalogLoaded(Result<Arc<Catalog>, CatalogLoadError>),
    CategorySelected(CategoryOption),
    SearchChanged(String),
    ToggleProduct(ProductId),
    RemoveProduct(ProductId),
    ClearSelection,
    ShowDetails(ProductId),
    CloseModal,
    GenerateRoutine,
    RoutineFinished(RoutineOutcome),
    QuestionChanged(String),
    QuestionSubmit,
    ChatReplied(Reply),
    ClearChat,
    ToggleRtl,
}

impl RoutineBuilder {
    pub fn new(services: Services) -> (Self, Task<Message>) {
        let store = services.catalog;
        let app = Self {
            catalog: None,
            category: None,
            search: String::new(),
            selection: SelectionStore::new(),
            modal: ModalState::default(),
            trigger: TriggerControl::new(GENERATE_LABEL),
            pipeline: services.pipeline,
            assistant: services.assistant,
            output: Output::Empty,
            conversation: Conversation::default(),
            question: String::new(),
            chat_pending: false,
            rtl: false,
        };
        let load = Task::perform(async move { store.load().await }, Message::CatalogLoaded);
        (app, load)
    }

    pub fn title(&self) -> String {
        String::from("Routine Builder")
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::CatalogLoaded(result) => {
                if let Err(e) = &result {
                    tracing::error!("Product browsing unavailable: {}", e);
                }
                self.catalog = Some(result);
                Task::none()
            }

            Message::CategorySelected(option) => {
                self.category = Some(option);
                Task::none()
            }

            Message::SearchChanged(query) => {
                self.search = query;
                Task::none()
            }

            Message::ToggleProduct(id) => {
                let change = self.selection.toggle(id);
                tracing::debug!("Selection {:?}; {} selected", change, self.selection.len());
                Task::none()
            }

            Message::RemoveProduct(id) => {
                if self.selection.remove(id) == SelectionChanged::Unchanged {
                    tracing::debug!("Remove ignored: {} not selected", id);
                }
                Task::none()
            }

            Message::ClearSelection => {
                self.selection.clear();
                Task::none()
            }

            Message::ShowDetails(id) => {
                self.modal.open(id);
                Task::none()
            }

            Message::CloseModal => {
                self.modal.close();
                Task::none()
            }

            Message::GenerateRoutine => self.generate_routine(),

            Message::RoutineFinished(RoutineOutcome::Busy) => Task::none(),

            Message::RoutineFinished(outcome) => {
                self.output = Output::Routine(outcome);
                Task::none()
            }

            Message::QuestionChanged(question) => {
                self.question = question;
                Task::none()
            }

            Message::QuestionSubmit => self.ask(),

            Message::ChatReplied(reply) => {
                self.conversation.push_assistant(reply);
                self.chat_pending = false;
                Task::none()
            }

            Message::ClearChat => {
                self.conversation.clear();
                Task::none()
            }

            Message::ToggleRtl => {
                self.rtl = !self.rtl;
                Task::none()
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        // escape listener only lives while the details overlay is open
        if self.modal.is_open() {
            keyboard::on_key_press(|key, _modifiers| match key {
                Key::Named(Named::Escape) => Some(Message::CloseModal),
                _ => None,
            })
        } else {
            Subscription::none()
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    // ========================================================================
    // Business Logic
    // ========================================================================

    fn generate_routine(&mut self) -> Task<Message> {
        if self.selection.is_empty() {
            self.output = Output::Routine(RoutineOutcome::NothingSelected);
            return Task::none();
        }
        let Some(guard) = self.trigger.try_begin(pipeline::BUSY_LABEL) else {
            return Task::none();
        };

        self.output = Output::Generating;
        let pipeline = self.pipeline.clone();
        let selection = self.selection.clone();
        Task::perform(
            async move { pipeline.execute(guard, &selection).await },
            Message::RoutineFinished,
        )
    }

    fn ask(&mut self) -> Task<Message> {
        let question = self.question.trim().to_string();
        if question.is_empty() || self.chat_pending {
            return Task::none();
        }

        self.conversation.push_user(&question);
        self.question.clear();
        self.chat_pending = true;

        let assistant = self.assistant.clone();
        let selection = self.selection.clone();
        Task::perform(
            async move { assistant.ask(&question, &selection).await },
            Message::ChatReplied,
        )
    }

    fn loaded_catalog(&self) -> Option<&Catalog> {
        match &self.catalog {
            Some(Ok(catalog)) => Some(catalog.as_ref()),
            _ => None,
        }
    }

    fn category_filter(&self) -> &str {
        self.category
            .as_ref()
            .map(CategoryOption::filter_value)
            .unwrap_or("")
    }

    /// Cards for the current filter
    pub fn cards(&self) -> Vec<CardView> {
        self.loaded_catalog()
            .map(|catalog| view_model::cards(catalog, self.category_filter(), &self.search, &self.selection))
            .unwrap_or_default()
    }

    pub fn summary(&self) -> Vec<view_model::SummaryItem> {
        view_model::summary(self.loaded_catalog(), &self.selection)
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Panel content hugs the end edge in right-to-left mode
    pub fn text_alignment(&self) -> Horizontal {
        if self.rtl {
            Horizontal::Right
        } else {
            Horizontal::Left
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn view(&self) -> Element<'_, Message> {
        let header = row![
            text("Routine Builder").size(22).color(theme::TEXT),
            Space::with_width(Length::Fill),
            button(text(if self.rtl { "LTR" } else { "RTL" }).size(13))
                .on_press(Message::ToggleRtl)
                .padding(Padding::from([6.0, 12.0])),
        ]
        .align_y(iced::Alignment::Center);

        let products = column![
            search_bar::view(
                self.loaded_catalog()
                    .map(view_model::category_options)
                    .unwrap_or_default(),
                self.category.clone(),
                &self.search,
                Message::CategorySelected,
                Message::SearchChanged,
            ),
            self.view_grid(),
        ]
        .spacing(12)
        .align_x(self.text_alignment())
        .width(Length::FillPortion(3));

        let side = column![self.view_selection(), self.view_chat()]
            .spacing(12)
            .align_x(self.text_alignment())
            .width(Length::FillPortion(2));

        let body: Row<'_, Message> = if self.rtl {
            row![side, products]
        } else {
            row![products, side]
        };

        let content = container(column![header, body.spacing(16)].spacing(16))
            .padding(16)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::window);

        match self.modal.current().and_then(|id| self.view_modal(id)) {
            Some(modal) => stack![
                content,
                opaque(
                    mouse_area(center(opaque(modal)).style(theme::overlay))
                        .on_press(Message::CloseModal)
                )
            ]
            .into(),
            None => content.into(),
        }
    }

    fn view_grid(&self) -> Element<'_, Message> {
        match &self.catalog {
            None => return placeholder("Loading products...".to_string()),
            Some(Err(e)) => return placeholder(format!("Could not load products: {}", e)),
            Some(Ok(_)) => {}
        }

        let cards = self.cards();
        if cards.is_empty() {
            return placeholder("No products match your search.".to_string());
        }

        let rows = cards.chunks(GRID_COLUMNS).map(|chunk| {
            let mut cells: Vec<Element<'_, Message>> = chunk.iter().cloned().map(view_card).collect();
            while cells.len() < GRID_COLUMNS {
                cells.push(Space::with_width(Length::FillPortion(1)).into());
            }
            Row::with_children(cells).spacing(12).into()
        });

        scrollable(Column::with_children(rows).spacing(12))
            .height(Length::Fill)
            .into()
    }

    fn view_selection(&self) -> Element<'_, Message> {
        let items = self.summary();
        let list: Element<'_, Message> = if items.is_empty() {
            text("No products selected").size(13).color(theme::TEXT_MUTED).into()
        } else {
            Column::with_children(items.into_iter().map(|item| {
                row![
                    text(item.name).size(14).color(theme::TEXT),
                    Space::with_width(Length::Fill),
                    button(text("Remove").size(12))
                        .on_press(Message::RemoveProduct(item.id))
                        .padding(Padding::from([4.0, 10.0]))
                        .style(button::secondary),
                ]
                .align_y(iced::Alignment::Center)
                .into()
            }))
            .spacing(6)
            .into()
        };

        let generate = button(text(self.trigger.label()).size(15))
            .on_press_maybe(
                self.trigger
                    .is_enabled()
                    .then_some(Message::GenerateRoutine),
            )
            .padding(Padding::from([8.0, 16.0]));

        let clear = button(text("Clear all").size(13))
            .on_press_maybe((!self.selection.is_empty()).then_some(Message::ClearSelection))
            .padding(Padding::from([8.0, 12.0]))
            .style(button::secondary);

        container(
            column![
                text("Selected Products").size(17).color(theme::TEXT),
                list,
                row![generate, clear].spacing(8),
            ]
            .spacing(10)
            .align_x(self.text_alignment()),
        )
        .padding(14)
        .width(Length::Fill)
        .style(theme::panel)
        .into()
    }

    fn view_chat(&self) -> Element<'_, Message> {
        let routine: Element<'_, Message> = match &self.output {
            Output::Empty => text("Select products and generate a routine, or ask a question.")
                .size(14)
                .color(theme::TEXT_MUTED)
                .into(),
            Output::Generating => text(pipeline::GENERATING).size(14).color(theme::TEXT_MUTED).into(),
            Output::Routine(RoutineOutcome::Succeeded { result, .. }) => column![
                markdown_view::view(&result.text),
                markdown_view::sources(&result.citations),
            ]
            .spacing(14)
            .into(),
            Output::Routine(other) => text(other.display_text()).size(14).color(theme::TEXT).into(),
        };

        let mut turns: Vec<Element<'_, Message>> = self
            .conversation
            .turns()
            .iter()
            .map(|turn| view_turn(turn.role, &turn.reply))
            .collect();
        if self.chat_pending {
            turns.push(text(chat::THINKING).size(14).color(theme::TEXT_MUTED).into());
        }

        let input = text_input("Ask a follow-up question...", &self.question)
            .on_input(Message::QuestionChanged)
            .on_submit(Message::QuestionSubmit)
            .padding(10)
            .size(15);

        let clear = button(text("Clear chat").size(12))
            .on_press_maybe(
                (!self.chat_pending && !self.conversation.turns().is_empty())
                    .then_some(Message::ClearChat),
            )
            .padding(Padding::from([6.0, 10.0]))
            .style(button::secondary);

        container(
            column![
                scrollable(
                    column![routine, Column::with_children(turns).spacing(10)]
                        .spacing(16)
                        .align_x(self.text_alignment())
                )
                .height(Length::Fill),
                row![input, clear].spacing(8).align_y(iced::Alignment::Center),
            ]
            .spacing(10)
            .align_x(self.text_alignment()),
        )
        .padding(14)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(theme::panel)
        .into()
    }

    fn view_modal(&self, id: ProductId) -> Option<Element<'_, Message>> {
        let product = self.loaded_catalog()?.find(id)?;
        let details = view_model::modal(product);

        Some(
            container(
                column![
                    row![
                        text(details.title).size(20).color(theme::TEXT),
                        Space::with_width(Length::Fill),
                        button(text("×").size(18))
                            .on_press(Message::CloseModal)
                            .style(button::text),
                    ]
                    .align_y(iced::Alignment::Center),
                    text(format!("{} · {}", details.brand, details.category))
                        .size(13)
                        .color(theme::TEXT_MUTED),
                    text(details.description).size(15).color(theme::TEXT),
                ]
                .spacing(10),
            )
            .width(Length::Fixed(460.0))
            .padding(20)
            .style(theme::panel)
            .into(),
        )
    }
}

fn placeholder<'a>(message: String) -> Element<'a, Message> {
    container(text(message).size(14).color(theme::TEXT_MUTED))
        .padding(24)
        .width(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

fn view_card<'a>(card: CardView) -> Element<'a, Message> {
    let details = button(text("Details").size(12))
        .on_press(Message::ShowDetails(card.id))
        .padding(Padding::from([4.0, 10.0]))
        .style(button::secondary);

    let mut body = column![
        text(card.name).size(15),
        text(card.brand).size(12).color(theme::TEXT_MUTED),
    ]
    .spacing(6);
    if !card.image.is_empty() {
        body = body.push(text(card.image).size(10).color(theme::TEXT_MUTED));
    }

    button(body.push(details))
    .on_press(Message::ToggleProduct(card.id))
    .padding(12)
    .width(Length::FillPortion(1))
    .style(theme::card(card.selected))
    .into()
}

fn view_turn(role: Role, reply: &Reply) -> Element<'_, Message> {
    let body: Element<'_, Message> = match reply {
        Reply::Answer(result) => column![
            markdown_view::view(&result.text),
            markdown_view::sources(&result.citations),
        ]
        .spacing(10)
        .into(),
        Reply::Notice(message) => text(message.as_str()).size(14).color(theme::TEXT).into(),
    };

    let fill = if role == Role::User {
        theme::SELECTION
    } else {
        Color::TRANSPARENT
    };
    container(body)
        .padding(10)
        .width(Length::Fill)
        .style(move |_theme| container::Style {
            background: Some(Background::Color(fill)),
            border: Border::default().rounded(8),
            ..Default::default()
        })
        .into()
}
