//! Data source seam for Pokemon names and details

use async_trait::async_trait;

use crate::state::PokemonDetail;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("graphql error: {0}")]
    Graphql(String),
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("fixture error: {0}")]
    Fixture(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Request(err.to_string())
    }
}

#[async_trait]
pub trait PokemonDataSource: Send + Sync {
    /// Known names, in source order, bounded by `first`.
    async fn list_names(&self, first: usize) -> Result<Vec<String>, SourceError>;

    /// Detail for an exact (case-sensitive) name; `Ok(None)` when no such
    /// Pokemon exists.
    async fn get_by_name(&self, name: &str) -> Result<Option<PokemonDetail>, SourceError>;

    /// Raw artwork bytes for a detail's `image` URL.
    async fn get_image(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}
