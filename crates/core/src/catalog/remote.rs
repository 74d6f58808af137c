use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::CatalogError;
use crate::models::{Deck, FlashcardSet, NewFlashcardSet};

/// Client for the `/api/questions` routes of the data service.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl RemoteCatalog {
    /// Build a client for the service rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Service root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/api/questions{}", self.base_url, suffix)
    }

    /// Distinct decks in use. Names this build does not know are skipped.
    pub async fn decks(&self) -> Result<Vec<Deck>, CatalogError> {
        let response = self.client.get(self.endpoint("/decks")).send().await?;
        let names: Vec<String> = check(response).await?.json().await?;
        let decks = names
            .iter()
            .filter_map(|name| match name.parse::<Deck>() {
                Ok(deck) => Some(deck),
                Err(err) => {
                    warn!("Ignoring deck from service: {err}");
                    None
                }
            })
            .collect();
        Ok(decks)
    }

    /// Sets for `deck` (or all sets), in the order the service returns them.
    pub async fn fetch_sets(&self, deck: Option<Deck>) -> Result<Vec<FlashcardSet>, CatalogError> {
        let mut request = self.client.get(self.endpoint(""));
        if let Some(deck) = deck {
            request = request.query(&[("deck", deck.id())]);
        }
        let response = request.send().await?;
        let sets: Vec<FlashcardSet> = check(response).await?.json().await?;
        debug!(deck = ?deck, count = sets.len(), "Fetched flashcard sets");
        Ok(sets)
    }

    /// POST a new set.
    pub async fn create_set(&self, draft: &NewFlashcardSet) -> Result<FlashcardSet, CatalogError> {
        let response = self
            .client
            .post(self.endpoint(""))
            .json(draft)
            .send()
            .await?;
        let created: FlashcardSet = check(response).await?.json().await?;
        info!(id = created.id.as_deref().unwrap_or("?"), deck = %created.deck, "Created flashcard set");
        Ok(created)
    }

    /// DELETE a set by id.
    pub async fn delete_set(&self, id: &str) -> Result<(), CatalogError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/{id}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        check(response).await?;
        info!(id, "Deleted flashcard set");
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    Err(CatalogError::Status {
        status: status.as_u16(),
        message,
    })
}
