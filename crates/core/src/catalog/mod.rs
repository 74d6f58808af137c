//! Deck catalog access: the REST data service or a local JSON file.

/// JSON-file catalog used offline.
pub mod local;
/// HTTP client for the flashcard data service.
pub mod remote;

use std::path::PathBuf;

use thiserror::Error;

pub use local::LocalCatalog;
pub use remote::RemoteCatalog;

use crate::{
    config::{AppConfig, CatalogSource},
    models::{Deck, FlashcardSet, NewFlashcardSet, ValidationError},
};

/// Failures raised by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The service could not be reached or the response was unreadable.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the `error` field of the body, if any.
        message: String,
    },
    /// No flashcard set carries the given id.
    #[error("flashcard set {0} not found")]
    NotFound(String),
    /// The draft broke a data-model invariant.
    #[error("invalid flashcard: {0}")]
    Invalid(#[from] ValidationError),
    /// Reading or writing the local store failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The local store holds malformed JSON.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Catalog backend selected by configuration.
#[derive(Debug, Clone)]
pub enum Catalog {
    /// REST data service.
    Remote(RemoteCatalog),
    /// Local JSON file.
    Local(LocalCatalog),
}

impl Catalog {
    /// Build the backend named by `config.catalog`.
    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        match config.catalog {
            CatalogSource::Remote => Ok(Catalog::Remote(RemoteCatalog::new(
                &config.api_base_url,
                config.request_timeout(),
            )?)),
            CatalogSource::Local => Ok(Catalog::Local(LocalCatalog::new(&config.data_dir))),
        }
    }

    /// Short description used in status lines.
    pub fn describe(&self) -> String {
        match self {
            Catalog::Remote(remote) => format!("service at {}", remote.base_url()),
            Catalog::Local(local) => format!("local store {}", local.path().display()),
        }
    }

    /// Decks that currently hold at least one set.
    pub async fn decks(&self) -> Result<Vec<Deck>, CatalogError> {
        match self {
            Catalog::Remote(remote) => remote.decks().await,
            Catalog::Local(local) => local.decks(),
        }
    }

    /// All sets of `deck`, or of every deck when `None`, newest first.
    pub async fn fetch_sets(&self, deck: Option<Deck>) -> Result<Vec<FlashcardSet>, CatalogError> {
        match self {
            Catalog::Remote(remote) => remote.fetch_sets(deck).await,
            Catalog::Local(local) => local.fetch_sets(deck),
        }
    }

    /// Validate and store a new set, returning it with its assigned id.
    pub async fn create_set(&self, draft: NewFlashcardSet) -> Result<FlashcardSet, CatalogError> {
        draft.validate()?;
        match self {
            Catalog::Remote(remote) => remote.create_set(&draft).await,
            Catalog::Local(local) => local.create_set(draft),
        }
    }

    /// Remove the set with `id`.
    pub async fn delete_set(&self, id: &str) -> Result<(), CatalogError> {
        match self {
            Catalog::Remote(remote) => remote.delete_set(id).await,
            Catalog::Local(local) => local.delete_set(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[tokio::test]
    async fn local_catalog_from_config() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig {
            catalog: CatalogSource::Local,
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let catalog = Catalog::from_config(&config)?;
        assert!(matches!(catalog, Catalog::Local(_)));

        let invalid = NewFlashcardSet::new(Deck::Children, "cat.png");
        let err = catalog.create_set(invalid).await.unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(ValidationError::NoQuestions)));

        let draft =
            NewFlashcardSet::new(Deck::Children, "cat.png").with_question("Colour?", ["a", "b"], 0);
        let created = catalog.create_set(draft).await?;
        assert_eq!(catalog.fetch_sets(Some(Deck::Children)).await?, vec![created]);
        assert_eq!(catalog.decks().await?, vec![Deck::Children]);
        Ok(())
    }

    #[test]
    fn remote_catalog_from_config() -> Result<()> {
        let config = AppConfig {
            api_base_url: "http://quiz.example:6000/".to_string(),
            ..AppConfig::default()
        };
        let catalog = Catalog::from_config(&config)?;
        assert_eq!(catalog.describe(), "service at http://quiz.example:6000");
        Ok(())
    }
}
