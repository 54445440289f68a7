//! Catalog and ledger configuration
//!
//! The catalog maps item names to unit prices. It is loaded once at start-up
//! and never mutated; the purchase engine receives it inside an
//! `Arc<LedgerConfig>` at construction instead of reading any global state.

use crate::types::Coins;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Starting balance of a newly registered account
pub const DEFAULT_STARTING_BALANCE: Coins = 1000;

/// Merchandise sold by the shop out of the box
const STANDARD_ITEMS: [(&str, Coins); 10] = [
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

/// Static item → unit price lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    prices: HashMap<String, Coins>,
}

/// One row of a catalog CSV file (`item,price`)
#[derive(Debug, Deserialize)]
struct CatalogRow {
    item: String,
    price: Coins,
}

impl Catalog {
    /// The standard shop catalog
    pub fn standard() -> Self {
        Self {
            prices: STANDARD_ITEMS
                .iter()
                .map(|(name, price)| (name.to_string(), *price))
                .collect(),
        }
    }

    /// Build a catalog from explicit `(item, price)` pairs
    ///
    /// Rejects empty names, non-positive prices and duplicate items.
    pub fn from_items<I, S>(items: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (S, Coins)>,
        S: Into<String>,
    {
        let mut prices = HashMap::new();
        for (name, price) in items {
            let name = name.into();
            if name.trim().is_empty() {
                return Err("Catalog item name must not be empty".to_string());
            }
            if price <= 0 {
                return Err(format!(
                    "Catalog price for '{}' must be positive, got {}",
                    name, price
                ));
            }
            if prices.insert(name.clone(), price).is_some() {
                return Err(format!("Duplicate catalog item '{}'", name));
            }
        }
        Ok(Self { prices })
    }

    /// Load a catalog from CSV with header `item,price`
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, String> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.deserialize::<CatalogRow>() {
            let row = result.map_err(|e| format!("Invalid catalog row: {}", e))?;
            rows.push((row.item, row.price));
        }

        Self::from_items(rows)
    }

    /// Load a catalog CSV file from disk
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Failed to open catalog '{}': {}", path.display(), e))?;
        Self::from_csv_reader(file)
    }

    /// Unit price of an item, if the catalog sells it
    pub fn price(&self, item: &str) -> Option<Coins> {
        self.prices.get(item).copied()
    }

    /// Number of items on sale
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the catalog sells nothing
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Immutable configuration shared by the engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Items for sale
    pub catalog: Catalog,

    /// Balance a new account opens with
    pub starting_balance: Coins,
}

impl LedgerConfig {
    /// Create a configuration from its parts
    pub fn new(catalog: Catalog, starting_balance: Coins) -> Self {
        Self {
            catalog,
            starting_balance,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(Catalog::standard(), DEFAULT_STARTING_BALANCE)
    }
}
