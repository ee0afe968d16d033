use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::menu::MenuItem;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub primary_asset_name: String,

    #[serde(default)]
    pub menu_items: Vec<MenuItem>,

    #[serde(default)]
    pub additional_asset_names: Vec<String>,
}

/// One saved translation session. Fields are private so a record cannot be
/// edited once built; the store only ever replaces or removes it wholesale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    id: Uuid,
    title: String,
    created_at: DateTime<Utc>,

    #[serde(default)]
    image_set: Vec<ImageRef>,
}

impl TranslationRecord {
    pub fn new(title: impl Into<String>, image_set: Vec<ImageRef>) -> Self {
        Self::with_identity(Uuid::new_v4(), Utc::now(), title, image_set)
    }

    pub fn with_identity(
        id: Uuid,
        created_at: DateTime<Utc>,
        title: impl Into<String>,
        image_set: Vec<ImageRef>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            created_at,
            image_set,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn image_set(&self) -> &[ImageRef] {
        &self.image_set
    }

    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.image_set
            .iter()
            .flat_map(|img| img.menu_items.iter().cloned())
            .collect()
    }

    /// Every asset name this record references, primary images first.
    pub fn asset_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for img in &self.image_set {
            names.push(img.primary_asset_name.as_str());
            names.extend(img.additional_asset_names.iter().map(String::as_str));
        }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub record_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            original_name: id.to_string(),
            translated_name: id.to_uppercase(),
            price: None,
            category: "c".to_string(),
        }
    }

    #[test]
    fn menu_items_follow_image_set_order() {
        let record = TranslationRecord::new(
            "t",
            vec![
                ImageRef {
                    primary_asset_name: "main_1.jpg".into(),
                    menu_items: vec![item("a"), item("b")],
                    additional_asset_names: vec!["additional_0_1.jpg".into()],
                },
                ImageRef {
                    primary_asset_name: "main_2.jpg".into(),
                    menu_items: vec![item("c")],
                    additional_asset_names: Vec::new(),
                },
            ],
        );

        let ids: Vec<String> = record.menu_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            record.asset_names(),
            vec!["main_1.jpg", "additional_0_1.jpg", "main_2.jpg"]
        );
    }

    #[test]
    fn missing_price_survives_json() {
        let record = TranslationRecord::new(
            "t",
            vec![ImageRef {
                primary_asset_name: "main.jpg".into(),
                menu_items: vec![item("a")],
                additional_asset_names: Vec::new(),
            }],
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: TranslationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.menu_items()[0].price, None);
    }
}
