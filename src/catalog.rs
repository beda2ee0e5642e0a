use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::rating::MAX_RATING;

/// Default dataset compiled into the binary. Used when no catalog file is
/// configured, so the browser works out of the box.
const EMBEDDED_CATALOG: &str = include_str!("../data/meals.json");

/// One entry in the meal catalog. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct MealRecord {
    pub id: String,
    pub name: String,
    pub dsc: String,
    pub country: String,
    pub img: String,
    pub rate: u8,
    pub price: f64,
}

impl MealRecord {
    /// Price formatted for display: currency prefix, two decimal places.
    pub fn price_display(&self, currency: &str) -> String {
        format!("{}{:.2}", currency, self.price)
    }
}

/// Raw JSON shape before validation. `rate` stays wide here so out-of-range
/// values can be clamped with a warning instead of failing deserialization.
#[derive(Debug, Deserialize)]
struct RawMeal {
    id: String,
    name: String,
    dsc: String,
    country: String,
    img: String,
    rate: i64,
    price: f64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate meal id `{0}` in catalog")]
    DuplicateId(String),
    #[error("meal `{0}` has negative price {1}")]
    NegativePrice(String, f64),
}

/// Fixed ordered sequence of meals, created once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    meals: Vec<MealRecord>,
}

impl Catalog {
    /// Parse and validate a JSON catalog. Duplicate ids and negative prices
    /// are errors; ratings outside 0-5 are clamped at this boundary with a
    /// warning so the rating renderer never sees out-of-range input.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let raw_meals: Vec<RawMeal> = serde_json::from_str(raw)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut meals = Vec::with_capacity(raw_meals.len());

        for raw in raw_meals {
            if !seen.insert(raw.id.clone()) {
                return Err(CatalogError::DuplicateId(raw.id));
            }
            if raw.price < 0.0 {
                return Err(CatalogError::NegativePrice(raw.id, raw.price));
            }

            let rate = if (0..=i64::from(MAX_RATING)).contains(&raw.rate) {
                raw.rate as u8
            } else {
                eprintln!(
                    "warning: meal `{}` has rating {}, clamping to 0-{}",
                    raw.id, raw.rate, MAX_RATING
                );
                raw.rate.clamp(0, i64::from(MAX_RATING)) as u8
            };

            meals.push(MealRecord {
                id: raw.id,
                name: raw.name,
                dsc: raw.dsc,
                country: raw.country,
                img: raw.img,
                rate,
                price: raw.price,
            });
        }

        Ok(Self { meals })
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file {}", path.display()))?;
        let catalog = Self::from_json(&raw)
            .with_context(|| format!("failed to parse catalog file {}", path.display()))?;
        Ok(catalog)
    }

    pub fn meals(&self) -> &[MealRecord] {
        &self.meals
    }

    pub fn get(&self, index: usize) -> Option<&MealRecord> {
        self.meals.get(index)
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal_json(id: &str, rate: i64, price: f64) -> String {
        format!(
            r#"{{"id":"{}","name":"Meal","dsc":"A meal.","country":"Nowhere","img":"x.jpg","rate":{},"price":{}}}"#,
            id, rate, price
        )
    }

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = Catalog::embedded().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog
            .meals()
            .iter()
            .any(|meal| meal.name == "Street Tacos" && meal.country == "Mexico"));
    }

    #[test]
    fn test_embedded_catalog_ids_unique() {
        let catalog = Catalog::embedded().unwrap();
        let mut seen = HashSet::new();
        for meal in catalog.meals() {
            assert!(seen.insert(&meal.id), "duplicate id {}", meal.id);
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let raw = format!("[{},{}]", meal_json("m1", 3, 1.0), meal_json("m1", 4, 2.0));
        let err = Catalog::from_json(&raw).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "m1"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let raw = format!("[{}]", meal_json("m1", 3, -0.5));
        let err = Catalog::from_json(&raw).unwrap_err();
        assert!(matches!(err, CatalogError::NegativePrice(id, _) if id == "m1"));
    }

    #[test]
    fn test_out_of_range_rating_clamped() {
        let raw = format!("[{},{}]", meal_json("m1", 9, 1.0), meal_json("m2", -2, 1.0));
        let catalog = Catalog::from_json(&raw).unwrap();
        assert_eq!(catalog.get(0).unwrap().rate, MAX_RATING);
        assert_eq!(catalog.get(1).unwrap().rate, 0);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            Catalog::from_json("not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_price_display() {
        let raw = format!("[{}]", meal_json("m1", 3, 8.5));
        let catalog = Catalog::from_json(&raw).unwrap();
        assert_eq!(catalog.get(0).unwrap().price_display("$"), "$8.50");
        assert_eq!(catalog.get(0).unwrap().price_display("€"), "€8.50");
    }
}
