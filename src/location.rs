//! Shareable query location (`/?q=...`) with a back stack

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How many previous locations are remembered for back navigation.
pub const BACK_STACK_CAP: usize = 50;

/// The query-string-of-record: the single `q` parameter of the location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QueryLocation {
    pub q: String,
    pub back: Vec<String>,
}

impl QueryLocation {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into().trim().to_string(),
            back: Vec::new(),
        }
    }

    /// Parse a location such as `/?q=Mr.%20Mime` or `?foo=1&q=pikachu`.
    ///
    /// Anything without a `q` parameter maps to the empty query.
    pub fn parse(location: &str) -> Self {
        let query = match location.split_once('?') {
            Some((_, query)) => query,
            None => return Self::default(),
        };
        let query = query.split('#').next().unwrap_or_default();
        let q = query
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == "q")
            .map(|(_, value)| decode_component(value))
            .unwrap_or_default();
        Self::new(q)
    }

    /// Render as the address line shows it.
    pub fn to_url(&self) -> String {
        if self.q.is_empty() {
            "/".to_string()
        } else {
            format!("/?q={}", urlencoding::encode(&self.q))
        }
    }

    /// Move to `q`. Returns false, and records nothing, when already there.
    pub fn navigate(&mut self, q: &str) -> bool {
        if self.q == q {
            return false;
        }
        let previous = std::mem::replace(&mut self.q, q.to_string());
        self.back.push(previous);
        if self.back.len() > BACK_STACK_CAP {
            self.back.remove(0);
        }
        true
    }

    /// Return to the previous location, if any.
    pub fn go_back(&mut self) -> Option<&str> {
        let previous = self.back.pop()?;
        self.q = previous;
        Some(&self.q)
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }
}

fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads_q_parameter() {
        assert_eq!(QueryLocation::parse("/?q=Pikachu").q, "Pikachu");
        assert_eq!(QueryLocation::parse("/?page=2&q=Mr.%20Mime").q, "Mr. Mime");
        assert_eq!(QueryLocation::parse("?q=nidoran+f#top").q, "nidoran f");
        assert_eq!(QueryLocation::parse("/").q, "");
        assert_eq!(QueryLocation::parse("/?page=2").q, "");
    }

    #[test]
    fn test_to_url_round_trips_special_characters() {
        let location = QueryLocation::new("Farfetch'd & co");
        let url = location.to_url();
        assert!(url.starts_with("/?q="));
        assert_eq!(QueryLocation::parse(&url).q, "Farfetch'd & co");
        assert_eq!(QueryLocation::default().to_url(), "/");
    }

    #[test]
    fn test_navigate_to_same_value_is_noop() {
        let mut location = QueryLocation::new("eevee");
        assert!(!location.navigate("eevee"));
        assert!(location.back.is_empty());

        assert!(location.navigate("vaporeon"));
        assert_eq!(location.back, vec!["eevee".to_string()]);
    }

    #[test]
    fn test_go_back_restores_previous() {
        let mut location = QueryLocation::default();
        location.navigate("Bulbasaur");
        location.navigate("Ivysaur");

        assert_eq!(location.go_back(), Some("Bulbasaur"));
        assert_eq!(location.go_back(), Some(""));
        assert_eq!(location.go_back(), None);
        assert!(!location.can_go_back());
    }

    #[test]
    fn test_back_stack_is_capped() {
        let mut location = QueryLocation::default();
        for i in 0..(BACK_STACK_CAP + 10) {
            location.navigate(&format!("q{i}"));
        }
        assert_eq!(location.back.len(), BACK_STACK_CAP);
    }
}
