use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::vocabulary::{CONDITIONS, PRICE_LEVELS, RELEVANCE_LEVELS};
use crate::export::{format_amount, parse_amount, render_csv, sanitize_cell, ExportError};

pub const GRID_HEADER: [&str; 5] = ["Kategorie", "Preisniveau", "Zustand", "Relevanz", "Fixpreis"];

/// One cell of the price grid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    pub category: String,
    pub price_level: String,
    pub condition: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMatrixEntry {
    #[serde(flatten)]
    pub key: PriceKey,
    #[serde(default)]
    pub fixed_price: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceLookup {
    pub fixed_price: Option<i64>,
    pub found: bool,
}

/// Fixed prices keyed by category, tier, condition, and relevance.
#[derive(Debug, Clone, Default)]
pub struct PriceMatrix {
    entries: BTreeMap<PriceKey, Option<i64>>,
}

impl PriceMatrix {
    pub fn lookup(&self, key: &PriceKey) -> PriceLookup {
        match self.entries.get(key).copied().flatten() {
            Some(price) => PriceLookup {
                fixed_price: Some(price),
                found: true,
            },
            None => PriceLookup {
                fixed_price: None,
                found: false,
            },
        }
    }

    pub fn upsert(&mut self, entry: PriceMatrixEntry) {
        self.entries.insert(entry.key, entry.fixed_price);
    }

    /// Removes every entry and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn remove_category(&mut self, category: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.category != category);
        before - self.entries.len()
    }

    pub fn entries(&self) -> Vec<PriceMatrixEntry> {
        self.entries
            .iter()
            .map(|(key, fixed_price)| PriceMatrixEntry {
                key: key.clone(),
                fixed_price: *fixed_price,
            })
            .collect()
    }

    /// Every combination for the given categories, with stored prices filled in.
    pub fn grid<'a, I>(&self, categories: I) -> Vec<PriceMatrixEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut rows = Vec::new();
        for category in categories {
            for level in PRICE_LEVELS {
                for condition in CONDITIONS {
                    for relevance in RELEVANCE_LEVELS {
                        let key = PriceKey {
                            category: category.to_string(),
                            price_level: level.to_string(),
                            condition: condition.to_string(),
                            relevance: relevance.to_string(),
                        };
                        let fixed_price = self.entries.get(&key).copied().flatten();
                        rows.push(PriceMatrixEntry { key, fixed_price });
                    }
                }
            }
        }
        rows
    }
}

pub fn render_grid(rows: Vec<PriceMatrixEntry>) -> Result<Vec<u8>, ExportError> {
    let rows = rows.into_iter().map(|row| {
        vec![
            sanitize_cell(&row.key.category),
            row.key.price_level,
            row.key.condition,
            row.key.relevance,
            row.fixed_price.map(format_amount).unwrap_or_default(),
        ]
    });
    render_csv(&GRID_HEADER, rows)
}

/// Reads a grid in the export layout. Blank or unreadable prices become `None`.
pub fn parse_grid(bytes: &[u8]) -> Result<Vec<PriceMatrixEntry>, GridError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let headers = reader.headers()?.clone();
    let mut columns = [0usize; 5];
    for (slot, name) in columns.iter_mut().zip(GRID_HEADER) {
        *slot = headers
            .iter()
            .position(|header| header == name)
            .ok_or(GridError::MissingColumn(name))?;
    }

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(columns[idx]).unwrap_or_default().to_string();
        entries.push(PriceMatrixEntry {
            key: PriceKey {
                category: field(0),
                price_level: field(1),
                condition: field(2),
                relevance: field(3),
            },
            fixed_price: parse_amount(&field(4)),
        });
    }
    Ok(entries)
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("price grid needs a '{0}' column")]
    MissingColumn(&'static str),
    #[error("price grid is not valid csv: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category: &str) -> PriceKey {
        PriceKey {
            category: category.to_string(),
            price_level: "Luxus".to_string(),
            condition: "Neu".to_string(),
            relevance: "Stark relevant".to_string(),
        }
    }

    #[test]
    fn lookup_distinguishes_missing_and_blank() {
        let mut matrix = PriceMatrix::default();
        assert!(!matrix.lookup(&key("Jeans")).found);

        matrix.upsert(PriceMatrixEntry {
            key: key("Jeans"),
            fixed_price: None,
        });
        assert!(!matrix.lookup(&key("Jeans")).found);

        matrix.upsert(PriceMatrixEntry {
            key: key("Jeans"),
            fixed_price: Some(4500),
        });
        let lookup = matrix.lookup(&key("Jeans"));
        assert!(lookup.found);
        assert_eq!(lookup.fixed_price, Some(4500));
    }

    #[test]
    fn grid_covers_every_combination() {
        let mut matrix = PriceMatrix::default();
        matrix.upsert(PriceMatrixEntry {
            key: key("Hoodie"),
            fixed_price: Some(1800),
        });
        let rows = matrix.grid(["Hoodie", "Top"]);
        assert_eq!(rows.len(), 2 * 4 * 4 * 3);
        assert_eq!(rows.iter().filter(|row| row.fixed_price.is_some()).count(), 1);
    }

    #[test]
    fn exported_grid_reads_back() {
        let mut matrix = PriceMatrix::default();
        matrix.upsert(PriceMatrixEntry {
            key: key("Blazer"),
            fixed_price: Some(3250),
        });
        let bytes = render_grid(matrix.grid(["Blazer"])).expect("render");
        let text = String::from_utf8(bytes.clone()).expect("utf8");
        assert!(text.starts_with("Kategorie,Preisniveau,Zustand,Relevanz,Fixpreis\n"));
        assert!(text.contains("Blazer,Luxus,Neu,Stark relevant,32.50"));

        let parsed = parse_grid(&bytes).expect("parse");
        assert_eq!(parsed.len(), 48);
        assert_eq!(
            parsed.iter().find(|entry| entry.key == key("Blazer")).and_then(|e| e.fixed_price),
            Some(3250)
        );
    }

    #[test]
    fn parse_requires_all_columns() {
        let err = parse_grid(b"Kategorie,Preisniveau\nJeans,Luxus\n").expect_err("missing columns");
        assert!(matches!(err, GridError::MissingColumn("Zustand")));
    }
}
