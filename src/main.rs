//! Routine Builder: browse a skincare catalog and generate AI routines
//!
//! Usage:
//!   routine-builder              - Open the builder window
//!   routine-builder serve        - Run the generateRoutine proxy
//!   routine-builder generate ... - Generate a routine headlessly
//!   routine-builder products     - List catalog products
//!   routine-builder details <id> - Show one product's details
//!   routine-builder help         - Show help

mod app;
mod backend;
mod catalog;
mod chat;
mod commands;
mod config;
mod error;
mod markdown;
mod pipeline;
mod selection;
mod server;
mod services;
mod ui;

use app::RoutineBuilder;
use commands::Command;
use config::Settings;
use iced::{window, Size};
use pipeline::TriggerControl;
use selection::SelectionStore;
use services::Services;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ui::{markup, view_model};

fn main() -> iced::Result {
    // Initialize logging (try_init so a second init is harmless)
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    match Command::parse(&args) {
        Command::Open => open_window(settings),
        Command::Help => {
            println!("{}", Command::help_text());
            Ok(())
        }
        Command::Invalid { message } => {
            eprintln!("{}", message);
            Ok(())
        }
        command => {
            run_headless(command, settings);
            Ok(())
        }
    }
}

fn run_headless(command: Command, settings: Settings) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: could not start async runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        match command {
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| settings.bind.clone());
                if let Err(e) = server::run(&settings, &bind).await {
                    tracing::error!("Proxy server error: {}", e);
                    eprintln!("Error: {}", e);
                }
            }
            Command::Generate { ids } => {
                let services = Services::from_settings(&settings);
                let mut selection = SelectionStore::new();
                for id in ids {
                    if !selection.contains(id) {
                        selection.toggle(id);
                    }
                }
                let catalog = services.catalog.load().await.ok();
                let summary = view_model::summary(catalog.as_deref(), &selection);
                println!("{}", markup::summary_list(&summary));

                let trigger = TriggerControl::new(app::GENERATE_LABEL);
                let outcome = services.pipeline.run(&trigger, &selection).await;
                println!("{}", outcome.to_html());
            }
            Command::Details { id } => {
                let services = Services::from_settings(&settings);
                match services.catalog.load().await {
                    Ok(catalog) => match catalog.find(id) {
                        Some(product) => println!("{}", markup::modal(&view_model::modal(product))),
                        None => eprintln!("Error: no product with id {}", id),
                    },
                    Err(e) => println!("{}", markup::placeholder(&e.to_string())),
                }
            }
            Command::Products { category, search } => {
                let services = Services::from_settings(&settings);
                match services.catalog.load().await {
                    Ok(catalog) => {
                        let cards = view_model::cards(
                            &catalog,
                            category.as_deref().unwrap_or(""),
                            search.as_deref().unwrap_or(""),
                            &SelectionStore::new(),
                        );
                        if cards.is_empty() {
                            println!("{}", markup::placeholder(markup::CATALOG_PLACEHOLDER));
                        } else {
                            println!("{}", markup::card_grid(&cards));
                        }
                    }
                    Err(e) => {
                        println!("{}", markup::placeholder(&e.to_string()));
                    }
                }
            }
            Command::Open | Command::Help | Command::Invalid { .. } => {}
        }
    });
}

fn open_window(settings: Settings) -> iced::Result {
    tracing::info!("Opening Routine Builder (catalog: {})", settings.catalog);

    iced::application(RoutineBuilder::title, RoutineBuilder::update, RoutineBuilder::view)
        .subscription(RoutineBuilder::subscription)
        .theme(RoutineBuilder::theme)
        .window(window::Settings {
            size: Size::new(1100.0, 720.0),
            position: window::Position::Centered,
            resizable: true,
            ..Default::default()
        })
        .antialiasing(true)
        .run_with(move || RoutineBuilder::new(Services::from_settings(&settings)))
}
