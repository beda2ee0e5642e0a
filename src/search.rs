use crate::catalog::{Catalog, MealRecord};

/// Normalize a string for matching. Matching is a case-insensitive
/// substring test, so both sides go through here.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

/// Normalize a user query. Whitespace-only queries mean "no query".
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

/// Whether a meal matches an already-normalized needle in any of the
/// three searchable fields: name, description, country.
pub fn meal_matches(meal: &MealRecord, needle: &str) -> bool {
    normalize(&meal.name).contains(needle)
        || normalize(&meal.dsc).contains(needle)
        || normalize(&meal.country).contains(needle)
}

/// Filter the catalog, returning indices of matching meals in catalog
/// order. A stable filter: never re-sorts, never fabricates entries.
/// An empty or whitespace-only query yields the entire catalog.
pub fn filter_indices(catalog: &Catalog, query: &str) -> Vec<usize> {
    match normalize_query(query) {
        Some(needle) => catalog
            .meals()
            .iter()
            .enumerate()
            .filter(|(_, meal)| meal_matches(meal, &needle))
            .map(|(index, _)| index)
            .collect(),
        None => (0..catalog.len()).collect(),
    }
}
