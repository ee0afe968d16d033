use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::model::{
    menu::MenuItem,
    record::{ImageRef, TranslationRecord},
    settings::Language,
};
use crate::parsers::menu_response;
use crate::services::{assets::AssetStore, record_store::RecordStore, upstream::MenuSource};

pub const UNTITLED: &str = "Untitled menu";

pub struct PipelineDeps<'a> {
    pub source: &'a dyn MenuSource,
    pub assets: &'a dyn AssetStore,
    pub store: &'a RecordStore,
}

/// Upload, parse, keep the images, then persist the record. Assets are written
/// before the record so a saved record never points at a missing image.
pub fn run(images: &[Vec<u8>], target: Language, deps: &PipelineDeps<'_>) -> Result<TranslationRecord> {
    if images.is_empty() {
        return Err(CoreError::NoImages);
    }

    let raw = deps.source.fetch(images, target.code())?;
    let menu = menu_response::parse(&raw)?;
    let items = menu.menu_items();

    let record = build_record(images, items, deps.assets)?;
    deps.store.save(record.clone())?;

    tracing::info!(
        id = %record.id(),
        title = record.title(),
        items = record.menu_items().len(),
        assets = record.asset_names().len(),
        "translation saved"
    );

    Ok(record)
}

/// The first image becomes the primary asset, the rest are stored as
/// additional images of the same entry. No images gives an empty image set.
pub fn build_record(
    images: &[Vec<u8>],
    menu_items: Vec<MenuItem>,
    assets: &dyn AssetStore,
) -> Result<TranslationRecord> {
    let title = generate_title(&menu_items);

    let Some((main, rest)) = images.split_first() else {
        return Ok(TranslationRecord::new(title, Vec::new()));
    };

    let primary_asset_name = assets.save(main, "main")?;

    let mut additional_asset_names: Vec<String> = Vec::with_capacity(rest.len());
    for (i, data) in rest.iter().enumerate() {
        additional_asset_names.push(assets.save(data, &format!("additional_{i}"))?);
    }

    Ok(TranslationRecord::new(
        title,
        vec![ImageRef {
            primary_asset_name,
            menu_items,
            additional_asset_names,
        }],
    ))
}

/// One shared category names the menu; otherwise the first dish does.
pub fn generate_title(items: &[MenuItem]) -> String {
    let categories: BTreeSet<&str> = items.iter().map(|i| i.category.as_str()).collect();

    if categories.len() == 1 {
        if let Some(category) = categories.first() {
            return (*category).to_string();
        }
    }

    match items.first() {
        Some(first) => first.original_name.clone(),
        None => UNTITLED.to_string(),
    }
}
