//! GraphQL Pokemon API client

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::OnceCell;

use crate::source::{PokemonDataSource, SourceError};
use crate::state::{Attack, Attacks, EvolutionStub, PokemonDetail, SizeRange};

pub const DEFAULT_ENDPOINT: &str = "https://graphql-pokemon2.vercel.app/";

const GET_ALL_POKEMON_NAMES: &str = r#"
query getAllPokemon($first: Int!) {
  pokemons(first: $first) {
    id
    name
  }
}"#;

const GET_POKEMON_BY_NAME: &str = r#"
query getPokemon($name: String!) {
  pokemon(name: $name) {
    id
    number
    name
    image
    classification
    types
    resistant
    weaknesses
    weight { minimum maximum }
    height { minimum maximum }
    attacks {
      fast { name type damage }
      special { name type damage }
    }
    evolutions { id number name types }
  }
}"#;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NamesData {
    pokemons: Option<Vec<Option<NameNode>>>,
}

#[derive(Debug, Deserialize)]
struct NameNode {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    pokemon: Option<PokemonNode>,
}

#[derive(Debug, Deserialize)]
struct PokemonNode {
    name: String,
    image: Option<String>,
    number: Option<String>,
    classification: Option<String>,
    types: Option<Vec<String>>,
    resistant: Option<Vec<String>>,
    weaknesses: Option<Vec<String>>,
    weight: Option<SizeRange>,
    height: Option<SizeRange>,
    attacks: Option<AttacksNode>,
    evolutions: Option<Vec<EvolutionNode>>,
}

#[derive(Debug, Deserialize)]
struct AttacksNode {
    fast: Option<Vec<AttackNode>>,
    special: Option<Vec<AttackNode>>,
}

#[derive(Debug, Deserialize)]
struct AttackNode {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    damage: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EvolutionNode {
    name: Option<String>,
    types: Option<Vec<String>>,
}

fn attacks_from_node(node: Option<Vec<AttackNode>>) -> Vec<Attack> {
    node.unwrap_or_default()
        .into_iter()
        .map(|attack| Attack {
            name: attack.name,
            kind: attack.kind,
            damage: attack.damage,
        })
        .collect()
}

fn detail_from_node(node: PokemonNode) -> PokemonDetail {
    let attacks = node
        .attacks
        .map(|attacks| Attacks {
            fast: attacks_from_node(attacks.fast),
            special: attacks_from_node(attacks.special),
        })
        .unwrap_or_default();
    PokemonDetail {
        name: node.name,
        number: node.number,
        classification: node.classification,
        types: node.types.unwrap_or_default(),
        resistant: node.resistant.unwrap_or_default(),
        weaknesses: node.weaknesses.unwrap_or_default(),
        weight: node.weight,
        height: node.height,
        attacks,
        evolutions: node
            .evolutions
            .unwrap_or_default()
            .into_iter()
            .map(|evolution| EvolutionStub {
                name: evolution.name,
                types: evolution.types.unwrap_or_default(),
            })
            .collect(),
        image: node.image.filter(|url| !url.trim().is_empty()),
    }
}

fn unwrap_response<T>(response: GraphqlResponse<T>) -> Result<T, SourceError> {
    if let Some(error) = response.errors.first() {
        if response.data.is_none() {
            return Err(SourceError::Graphql(error.message.clone()));
        }
    }
    response
        .data
        .ok_or_else(|| SourceError::Parse("response has no data".to_string()))
}

/// Parse a names response body.
pub fn parse_names(body: &[u8]) -> Result<Vec<String>, SourceError> {
    let response: GraphqlResponse<NamesData> =
        serde_json::from_slice(body).map_err(|err| SourceError::Parse(err.to_string()))?;
    let data = unwrap_response(response)?;
    Ok(data
        .pokemons
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|node| node.name)
        .collect())
}

/// Parse a detail response body; a null `pokemon` is not-found.
pub fn parse_detail(body: &[u8]) -> Result<Option<PokemonDetail>, SourceError> {
    let response: GraphqlResponse<DetailData> =
        serde_json::from_slice(body).map_err(|err| SourceError::Parse(err.to_string()))?;
    let data = unwrap_response(response)?;
    Ok(data.pokemon.map(detail_from_node))
}

// ============================================================================
// Client
// ============================================================================

/// Network data source. The name universe is memoized for the session and
/// kept in an on-disk response cache; details always go to the network.
pub struct GraphqlSource {
    endpoint: String,
    cache_root: Option<PathBuf>,
    names: OnceCell<Vec<String>>,
}

impl GraphqlSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cache_root: Some(default_cache_root()),
            names: OnceCell::new(),
        }
    }

    pub fn without_disk_cache(mut self) -> Self {
        self.cache_root = None;
        self
    }

    async fn post(&self, query: &str, variables: serde_json::Value) -> Result<Vec<u8>, SourceError> {
        let request = GraphqlRequest { query, variables };
        let response = http_client()
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn post_cached<T>(
        &self,
        query: &str,
        variables: serde_json::Value,
        parse: fn(&[u8]) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        let Some(root) = &self.cache_root else {
            let bytes = self.post(query, variables).await?;
            return parse(&bytes);
        };
        let key = format!("{}\n{}\n{}", self.endpoint, query, variables);
        let path = cache_path(root, "graphql", &key);
        if let Some(bytes) = read_cache(&path).await {
            match parse(&bytes) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::debug!(path = %path.display(), "dropping bad cache entry: {err}");
                    let _ = fs::remove_file(&path).await;
                }
            }
        }
        let bytes = self.post(query, variables).await?;
        let value = parse(&bytes)?;
        write_cache(&path, &bytes).await;
        Ok(value)
    }
}

impl Default for GraphqlSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl PokemonDataSource for GraphqlSource {
    async fn list_names(&self, first: usize) -> Result<Vec<String>, SourceError> {
        let names = self
            .names
            .get_or_try_init(|| async {
                tracing::debug!(first, "fetching name universe");
                self.post_cached(
                    GET_ALL_POKEMON_NAMES,
                    serde_json::json!({ "first": first }),
                    parse_names,
                )
                .await
            })
            .await?;
        Ok(names.iter().take(first).cloned().collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<PokemonDetail>, SourceError> {
        tracing::debug!(name, "fetching detail");
        let bytes = self
            .post(GET_POKEMON_BY_NAME, serde_json::json!({ "name": name }))
            .await?;
        parse_detail(&bytes)
    }

    async fn get_image(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let path = self
            .cache_root
            .as_ref()
            .map(|root| cache_path(root, "image", url));
        if let Some(bytes) = match &path {
            Some(path) => read_cache(path).await,
            None => None,
        } {
            return Ok(bytes);
        }
        tracing::debug!(url, "fetching artwork");
        let response = http_client().get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?.to_vec();
        if let Some(path) = &path {
            write_cache(path, &bytes).await;
        }
        Ok(bytes)
    }
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

fn default_cache_root() -> PathBuf {
    let base = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    base.join(".cache").join("pokesearch")
}

fn cache_path(root: &Path, kind: &str, key: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hex::encode(hasher.finalize());
    root.join(kind).join(digest)
}

async fn read_cache(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).await.ok()
}

async fn write_cache(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent).await;
    }
    if let Err(err) = fs::write(path, bytes).await {
        tracing::debug!(path = %path.display(), "cache write failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_names_skips_nulls() {
        let body = br#"{"data":{"pokemons":[{"id":"1","name":"Bulbasaur"},null,{"id":"3","name":null},{"id":"4","name":"Charmander"}]}}"#;
        assert_eq!(parse_names(body).unwrap(), vec!["Bulbasaur", "Charmander"]);
    }

    #[test]
    fn test_parse_detail_maps_nullable_fields() {
        let body = br#"{"data":{"pokemon":{
            "id":"UG9rZW1vbjowMDE=","number":"001","name":"Bulbasaur",
            "image":"https://img.pokemondb.net/artwork/bulbasaur.jpg",
            "classification":"Seed Pokemon","types":["Grass","Poison"],
            "resistant":null,"weaknesses":["Fire"],
            "weight":{"minimum":"6.04kg","maximum":"7.76kg"},"height":null,
            "attacks":{"fast":[{"name":"Vine Whip","type":"Grass","damage":7}],"special":null},
            "evolutions":[{"id":"2","number":"002","name":"Ivysaur","types":["Grass","Poison"]}]
        }}}"#;
        let detail = parse_detail(body).unwrap().unwrap();
        assert_eq!(detail.name, "Bulbasaur");
        assert_eq!(detail.classification.as_deref(), Some("Seed Pokemon"));
        assert_eq!(detail.types, vec!["Grass", "Poison"]);
        assert!(detail.resistant.is_empty());
        assert_eq!(
            detail.weight.as_ref().and_then(SizeRange::label).as_deref(),
            Some("6.04kg - 7.76kg")
        );
        assert!(detail.height.is_none());
        assert_eq!(detail.attacks.fast[0].damage, Some(7));
        assert!(detail.attacks.special.is_empty());
        assert_eq!(detail.evolutions[0].name.as_deref(), Some("Ivysaur"));
        assert_eq!(
            detail.image.as_deref(),
            Some("https://img.pokemondb.net/artwork/bulbasaur.jpg")
        );
    }

    #[test]
    fn test_parse_detail_null_is_not_found() {
        let body = br#"{"data":{"pokemon":null}}"#;
        assert_eq!(parse_detail(body).unwrap(), None);
    }

    #[test]
    fn test_graphql_errors_surface_without_data() {
        let body = br#"{"data":null,"errors":[{"message":"boom"}]}"#;
        let err = parse_detail(body).unwrap_err();
        assert!(matches!(err, SourceError::Graphql(message) if message == "boom"));
    }

    #[test]
    fn test_cache_path_is_stable_per_key() {
        let root = Path::new("/tmp/root");
        assert_eq!(cache_path(root, "graphql", "a"), cache_path(root, "graphql", "a"));
        assert_ne!(cache_path(root, "graphql", "a"), cache_path(root, "graphql", "b"));
    }
}
