use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::error::Result;
use crate::model::settings::{Currency, Language, UserSettings};
use crate::parsers::menu_response;
use crate::services::{
    assets::{AssetDir, AssetStore},
    pipeline::{self, PipelineDeps},
    record_store::RecordStore,
    settings::SettingsFile,
    upstream::{HttpMenuSource, MenuSource},
};

mod command;
use command::Command;

/// Everything a request handler can touch. Built once at startup.
pub struct Core {
    store: RecordStore,
    assets: AssetDir,
    settings: SettingsFile,
    source: Box<dyn MenuSource>,
}

impl Core {
    pub fn open(config: &CoreConfig) -> Result<Self> {
        let source = HttpMenuSource::new(config.upstream())?;
        Self::with_source(config, Box::new(source))
    }

    pub fn with_source(config: &CoreConfig, source: Box<dyn MenuSource>) -> Result<Self> {
        Ok(Self {
            store: RecordStore::open(config.records_root())?,
            assets: AssetDir::new(config.assets_dir()),
            settings: SettingsFile::new(config.settings_path()),
            source,
        })
    }
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn record_id_from_payload(payload: &Value) -> std::result::Result<Uuid, String> {
    let raw = payload
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "payload.id is required".to_string())?;

    Uuid::parse_str(raw.trim()).map_err(|e| format!("invalid payload.id: {e}"))
}

fn images_from_payload(payload: &Value) -> std::result::Result<Vec<Vec<u8>>, String> {
    let arr = payload
        .get("images")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "payload.images must be an array".to_string())?;

    let mut images: Vec<Vec<u8>> = Vec::with_capacity(arr.len());

    for (i, v) in arr.iter().enumerate() {
        let encoded = v
            .as_str()
            .ok_or_else(|| format!("invalid image at index {i}: expected base64 string"))?;
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| format!("invalid image at index {i}: {e}"))?;
        images.push(bytes);
    }

    Ok(images)
}

fn settings_options() -> Value {
    let languages: Vec<Value> = Language::ALL
        .iter()
        .map(|l| json!({ "code": l.code(), "name": l.display_name() }))
        .collect();
    let currencies: Vec<Value> = Currency::ALL
        .iter()
        .map(|c| json!({ "code": c.code(), "name": c.display_name(), "symbol": c.symbol() }))
        .collect();

    json!({ "languages": languages, "currencies": currencies })
}

pub fn handle(core: &Core, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    tracing::debug!(cmd = cmd_str, "handling request");

    match Command::from(cmd_str) {
        Command::Ping => ok(id, json!({ "message": "menupal-core alive" })),

        Command::MenuParse => {
            let raw = payload.get("raw").and_then(|v| v.as_str()).unwrap_or("");
            if raw.is_empty() {
                return err(id, "payload.raw is required");
            }
            match menu_response::parse(raw.as_bytes()) {
                Ok(menu) => ok(
                    id,
                    json!({ "items": menu.menu_items(), "categories": menu.categories }),
                ),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::MenuTranslate => {
            let images = match images_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let target = match payload.get("target_language") {
                Some(v) => match serde_json::from_value::<Language>(v.clone()) {
                    Ok(lang) => lang,
                    Err(e) => return err(id, format!("invalid payload.target_language: {e}")),
                },
                None => core.settings.load().preferred_language,
            };

            let deps = PipelineDeps {
                source: core.source.as_ref(),
                assets: &core.assets,
                store: &core.store,
            };

            match pipeline::run(&images, target, &deps) {
                Ok(record) => ok(id, json!({ "record": record })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::RecordList => match core.store.list() {
            Ok(records) => ok(id, json!({ "records": records })),
            Err(e) => err(id, e.to_string()),
        },

        Command::RecordGet => {
            let record_id = match record_id_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };
            match core.store.get(record_id) {
                Ok(record) => ok(id, json!({ "record": record })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::RecordDelete => {
            let record_id = match record_id_from_payload(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };
            match core.store.delete(record_id) {
                Ok(()) => ok(id, json!({ "deleted": record_id })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::RecordClear => match core.store.clear_all() {
            Ok(()) => ok(id, json!({})),
            Err(e) => err(id, e.to_string()),
        },

        Command::RecordCompact => match core.store.compact() {
            Ok(report) => ok(id, json!({ "report": report })),
            Err(e) => err(id, e.to_string()),
        },

        Command::SettingsGet => ok(
            id,
            json!({ "settings": core.settings.load(), "options": settings_options() }),
        ),

        Command::SettingsSave => {
            let settings_val = payload.get("settings").cloned().unwrap_or(Value::Null);
            if settings_val.is_null() {
                return err(id, "payload.settings is required");
            }

            let settings: UserSettings = match serde_json::from_value(settings_val) {
                Ok(v) => v,
                Err(e) => return err(id, format!("invalid payload.settings: {e}")),
            };

            match core.settings.save(&settings) {
                Ok(()) => ok(id, json!({ "settings": settings })),
                Err(e) => err(id, format!("failed to save settings: {e}")),
            }
        }

        Command::AssetLoad => {
            let name = payload.get("name").and_then(|v| v.as_str()).unwrap_or("");
            if name.is_empty() {
                return err(id, "payload.name is required");
            }
            match core.assets.load(name) {
                Some(bytes) => ok(id, json!({ "image": STANDARD.encode(bytes) })),
                None => err(id, "asset not found"),
            }
        }

        Command::Unknown => err(id, "unknown command"),
    }
}
