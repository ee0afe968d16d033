use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// `<category original name>_<item original name>`; stable across re-parses.
    pub id: String,

    pub original_name: String,
    pub translated_name: String,

    #[serde(default)]
    pub price: Option<i64>,

    /// Translated name of the owning category.
    pub category: String,
}

impl MenuItem {
    pub fn derive_id(category_original: &str, item_original: &str) -> String {
        format!("{category_original}_{item_original}")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub original_name: String,
    pub translated_name: String,

    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Menu {
    pub categories: Vec<Category>,
}

impl Menu {
    /// All items in source order, category by category.
    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().cloned())
            .collect()
    }
}
