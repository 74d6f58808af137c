#![warn(clippy::all, missing_docs)]

//! Core domain logic for FlashPeek.
//!
//! This crate hosts the flashcard data model, configuration handling,
//! the deck catalog clients, and the play session engine used by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod models;
pub mod play;

pub use catalog::{Catalog, CatalogError};
pub use config::AppConfig;
pub use models::{Deck, FlashcardSet, NewFlashcardSet, Question, ValidationError};
pub use play::{Phase, PlayConfig, PlayEngine, PlayView};
