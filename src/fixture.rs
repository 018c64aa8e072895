//! Offline data source backed by a RON fixture file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::source::{PokemonDataSource, SourceError};
use crate::state::PokemonDetail;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FixtureFile {
    #[serde(default)]
    pub pokemon: Vec<PokemonDetail>,
}

#[derive(Clone, Debug, Default)]
pub struct FixtureSource {
    pokemon: Vec<PokemonDetail>,
    /// Relative image paths resolve against this directory
    base_dir: Option<PathBuf>,
}

impl FixtureSource {
    pub fn new(pokemon: Vec<PokemonDetail>) -> Self {
        Self {
            pokemon,
            base_dir: None,
        }
    }

    pub fn from_ron(source: &str) -> Result<Self, SourceError> {
        let file: FixtureFile =
            ron::de::from_str(source).map_err(|e| SourceError::Fixture(e.to_string()))?;
        Ok(Self::new(file.pokemon))
    }

    pub async fn load(path: &Path) -> Result<Self, SourceError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::Fixture(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut source = Self::from_ron(&contents)?;
        source.base_dir = path.parent().map(Path::to_path_buf);
        Ok(source)
    }
}

#[async_trait]
impl PokemonDataSource for FixtureSource {
    async fn list_names(&self, first: usize) -> Result<Vec<String>, SourceError> {
        Ok(self
            .pokemon
            .iter()
            .take(first)
            .map(|pokemon| pokemon.name.clone())
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<PokemonDetail>, SourceError> {
        Ok(self.pokemon.iter().find(|pokemon| pokemon.name == name).cloned())
    }

    async fn get_image(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(SourceError::Fixture(format!("offline, not fetching {url}")));
        }
        let path = match &self.base_dir {
            Some(base) => base.join(url),
            None => PathBuf::from(url),
        };
        tokio::fs::read(&path)
            .await
            .map_err(|e| SourceError::Fixture(format!("Failed to read {}: {}", path.display(), e)))
    }
}
