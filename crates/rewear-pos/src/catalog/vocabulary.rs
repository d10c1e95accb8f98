use serde::{Deserialize, Serialize};

pub const CATEGORIES: [&str; 17] = [
    "Kleider",
    "Strickmode/Cardigans",
    "Sweatshirt",
    "Hoodie",
    "Hosen",
    "Jeans",
    "Jacken",
    "Blazer",
    "Mäntel",
    "Shirts",
    "Top",
    "Hemd",
    "Bluse",
    "Röcke/Jupe",
    "Sportbekleidung",
    "Bademode",
    "Shorts",
];

pub const PRICE_LEVELS: [&str; 4] = ["Luxus", "Teuer", "Mittel", "Günstig"];

pub const CONDITIONS: [&str; 4] = ["Neu", "Kaum benutzt", "Gebraucht/Gut", "Abgenutzt"];

pub const RELEVANCE_LEVELS: [&str; 3] = ["Stark relevant", "Wichtig", "Nicht beliebt"];

/// A category added by the shop on top of the built-in list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategory {
    pub name: String,
    /// Base64 image shown on the category tile.
    #[serde(default)]
    pub image: Option<String>,
}

/// Everything the till offers for item classification.
#[derive(Debug, Clone, Serialize)]
pub struct Vocabulary {
    pub categories: Vec<String>,
    pub price_levels: Vec<String>,
    pub conditions: Vec<String>,
    pub relevance_levels: Vec<String>,
    pub custom_categories: Vec<CustomCategory>,
}

impl Vocabulary {
    pub fn with_custom(custom_categories: Vec<CustomCategory>) -> Self {
        let owned = |values: &[&str]| -> Vec<String> {
            values.iter().map(|value| value.to_string()).collect()
        };
        Self {
            categories: owned(&CATEGORIES),
            price_levels: owned(&PRICE_LEVELS),
            conditions: owned(&CONDITIONS),
            relevance_levels: owned(&RELEVANCE_LEVELS),
            custom_categories,
        }
    }
}

pub fn is_builtin_category(name: &str) -> bool {
    CATEGORIES.contains(&name)
}
