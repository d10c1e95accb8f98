use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use super::matrix::{
    parse_grid, render_grid, GridError, PriceKey, PriceLookup, PriceMatrix, PriceMatrixEntry,
};
use super::vocabulary::{
    is_builtin_category, CustomCategory, Vocabulary, CATEGORIES, CONDITIONS, PRICE_LEVELS,
    RELEVANCE_LEVELS,
};
use crate::export::ExportError;

#[derive(Debug, Default)]
struct CatalogState {
    matrix: PriceMatrix,
    custom: Vec<CustomCategory>,
}

/// Outcome of a grid import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub updated: usize,
    pub skipped: usize,
}

/// Item vocabularies, shop-defined categories, and the fixed-price matrix.
#[derive(Debug, Default)]
pub struct CatalogService {
    state: Mutex<CatalogState>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, CatalogState>, CatalogError> {
        self.state.lock().map_err(|_| CatalogError::Unavailable)
    }

    pub fn vocabulary(&self) -> Result<Vocabulary, CatalogError> {
        Ok(Vocabulary::with_custom(self.state()?.custom.clone()))
    }

    pub fn custom_categories(&self) -> Result<Vec<CustomCategory>, CatalogError> {
        Ok(self.state()?.custom.clone())
    }

    pub fn add_custom_category(
        &self,
        category: CustomCategory,
    ) -> Result<CustomCategory, CatalogError> {
        let name = category.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation("category name is required".to_string()));
        }

        let mut state = self.state()?;
        if is_builtin_category(&name) || state.custom.iter().any(|c| c.name == name) {
            return Err(CatalogError::Conflict(format!("category '{name}' already exists")));
        }
        let category = CustomCategory {
            name,
            image: category.image,
        };
        state.custom.push(category.clone());
        info!(category = %category.name, "custom category added");
        Ok(category)
    }

    pub fn set_category_image(
        &self,
        name: &str,
        image: Option<String>,
    ) -> Result<CustomCategory, CatalogError> {
        let mut state = self.state()?;
        let category = state
            .custom
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| CatalogError::NotFound(format!("category '{name}'")))?;
        category.image = image;
        Ok(category.clone())
    }

    /// Removes a custom category along with any prices recorded for it.
    pub fn remove_custom_category(&self, name: &str) -> Result<(), CatalogError> {
        let mut state = self.state()?;
        let before = state.custom.len();
        state.custom.retain(|c| c.name != name);
        if state.custom.len() == before {
            return Err(CatalogError::NotFound(format!("category '{name}'")));
        }
        let prices = state.matrix.remove_category(name);
        info!(category = %name, prices, "custom category removed");
        Ok(())
    }

    pub fn lookup(&self, key: &PriceKey) -> Result<PriceLookup, CatalogError> {
        Ok(self.state()?.matrix.lookup(key))
    }

    pub fn entries(&self) -> Result<Vec<PriceMatrixEntry>, CatalogError> {
        Ok(self.state()?.matrix.entries())
    }

    pub fn upsert(&self, entry: PriceMatrixEntry) -> Result<PriceMatrixEntry, CatalogError> {
        if entry.fixed_price.is_some_and(|price| price < 0) {
            return Err(CatalogError::Validation("fixed price cannot be negative".to_string()));
        }
        let mut state = self.state()?;
        if let Some(unknown) = unknown_value(&entry.key, &state.custom) {
            return Err(CatalogError::Validation(format!("unknown value '{unknown}'")));
        }
        state.matrix.upsert(entry.clone());
        Ok(entry)
    }

    pub fn clear(&self) -> Result<usize, CatalogError> {
        let removed = self.state()?.matrix.clear();
        warn!(removed, "price matrix cleared");
        Ok(removed)
    }

    /// Full grid over built-in then custom categories.
    pub fn export_csv(&self) -> Result<Vec<u8>, CatalogError> {
        let state = self.state()?;
        let mut categories: Vec<&str> = CATEGORIES.to_vec();
        categories.extend(state.custom.iter().map(|c| c.name.as_str()));
        Ok(render_grid(state.matrix.grid(categories))?)
    }

    /// Applies a grid in export layout; rows with unknown values are skipped.
    pub fn import_csv(&self, bytes: &[u8]) -> Result<ImportSummary, CatalogError> {
        let rows = parse_grid(bytes)?;
        let mut state = self.state()?;
        let mut summary = ImportSummary {
            updated: 0,
            skipped: 0,
        };
        for row in rows {
            let negative = row.fixed_price.is_some_and(|price| price < 0);
            if negative || unknown_value(&row.key, &state.custom).is_some() {
                summary.skipped += 1;
                continue;
            }
            state.matrix.upsert(row);
            summary.updated += 1;
        }
        info!(updated = summary.updated, skipped = summary.skipped, "price grid imported");
        Ok(summary)
    }
}

fn unknown_value<'a>(key: &'a PriceKey, custom: &[CustomCategory]) -> Option<&'a str> {
    let category_known =
        is_builtin_category(&key.category) || custom.iter().any(|c| c.name == key.category);
    if !category_known {
        return Some(&key.category);
    }
    if !PRICE_LEVELS.contains(&key.price_level.as_str()) {
        return Some(&key.price_level);
    }
    if !CONDITIONS.contains(&key.condition.as_str()) {
        return Some(&key.condition);
    }
    if !RELEVANCE_LEVELS.contains(&key.relevance.as_str()) {
        return Some(&key.relevance);
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("catalog state unavailable")]
    Unavailable,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category: &str, relevance: &str) -> PriceKey {
        PriceKey {
            category: category.to_string(),
            price_level: "Mittel".to_string(),
            condition: "Gebraucht/Gut".to_string(),
            relevance: relevance.to_string(),
        }
    }

    #[test]
    fn upsert_then_lookup_returns_price() {
        let catalog = CatalogService::new();
        catalog
            .upsert(PriceMatrixEntry {
                key: key("Jeans", "Wichtig"),
                fixed_price: Some(1500),
            })
            .expect("upsert");
        let lookup = catalog.lookup(&key("Jeans", "Wichtig")).expect("lookup");
        assert_eq!(lookup.fixed_price, Some(1500));
        assert!(lookup.found);
        assert!(!catalog.lookup(&key("Jeans", "Nicht beliebt")).expect("lookup").found);
    }

    #[test]
    fn unknown_vocabulary_is_rejected() {
        let catalog = CatalogService::new();
        let err = catalog
            .upsert(PriceMatrixEntry {
                key: key("Jeans", "Sehr wichtig"),
                fixed_price: Some(1500),
            })
            .expect_err("unknown relevance");
        assert!(matches!(err, CatalogError::Validation(message) if message.contains("Sehr wichtig")));
        assert!(catalog.entries().expect("entries").is_empty());
    }

    #[test]
    fn custom_categories_reject_duplicates_and_builtins() {
        let catalog = CatalogService::new();
        let added = catalog
            .add_custom_category(CustomCategory {
                name: "  Accessoires ".to_string(),
                image: None,
            })
            .expect("added");
        assert_eq!(added.name, "Accessoires");

        for name in ["Accessoires", "Jeans"] {
            let err = catalog
                .add_custom_category(CustomCategory {
                    name: name.to_string(),
                    image: None,
                })
                .expect_err("duplicate");
            assert!(matches!(err, CatalogError::Conflict(_)));
        }
        assert_eq!(catalog.vocabulary().expect("vocabulary").custom_categories.len(), 1);
    }

    #[test]
    fn removing_custom_category_drops_its_prices() {
        let catalog = CatalogService::new();
        catalog
            .add_custom_category(CustomCategory {
                name: "Taschen".to_string(),
                image: None,
            })
            .expect("added");
        catalog
            .upsert(PriceMatrixEntry {
                key: key("Taschen", "Wichtig"),
                fixed_price: Some(900),
            })
            .expect("custom category is priceable");

        catalog.remove_custom_category("Taschen").expect("removed");
        assert!(catalog.entries().expect("entries").is_empty());
        assert!(matches!(
            catalog.remove_custom_category("Taschen"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn import_skips_unknown_rows() {
        let catalog = CatalogService::new();
        let csv = "Kategorie,Preisniveau,Zustand,Relevanz,Fixpreis\n\
                   Jeans,Teuer,Neu,Wichtig,25.00\n\
                   Socken,Teuer,Neu,Wichtig,5.00\n\
                   Hoodie,Mittel,Abgenutzt,Nicht beliebt,\n";
        let summary = catalog.import_csv(csv.as_bytes()).expect("import");
        assert_eq!(summary, ImportSummary { updated: 2, skipped: 1 });

        let jeans = PriceKey {
            category: "Jeans".to_string(),
            price_level: "Teuer".to_string(),
            condition: "Neu".to_string(),
            relevance: "Wichtig".to_string(),
        };
        assert_eq!(catalog.lookup(&jeans).expect("lookup").fixed_price, Some(2500));
        assert_eq!(catalog.clear().expect("clear"), 2);
    }

    #[test]
    fn export_lists_full_grid() {
        let catalog = CatalogService::new();
        let text = String::from_utf8(catalog.export_csv().expect("export")).expect("utf8");
        assert_eq!(text.lines().count(), 1 + CATEGORIES.len() * 4 * 4 * 3);
    }
}
