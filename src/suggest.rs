//! Prefix suggestions over the known-name universe

/// Maximum number of suggestions shown in the dropdown.
pub const MAX_SUGGESTIONS: usize = 8;

/// Names whose lowercase form starts with the trimmed, lowercased query.
///
/// Source order is preserved among matches and the list is capped at
/// [`MAX_SUGGESTIONS`]. An empty query yields nothing; history takes over
/// in that case.
pub fn suggestions(query: &str, names: &[String]) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    names
        .iter()
        .filter(|name| name.to_lowercase().starts_with(&query))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}
