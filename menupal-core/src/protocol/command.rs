#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    MenuParse,
    MenuTranslate,
    RecordList,
    RecordGet,
    RecordDelete,
    RecordClear,
    RecordCompact,
    SettingsGet,
    SettingsSave,
    AssetLoad,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "menu.parse" => Command::MenuParse,
            "menu.translate" => Command::MenuTranslate,
            "record.list" => Command::RecordList,
            "record.get" => Command::RecordGet,
            "record.delete" => Command::RecordDelete,
            "record.clear" => Command::RecordClear,
            "record.compact" => Command::RecordCompact,
            "settings.get" => Command::SettingsGet,
            "settings.save" => Command::SettingsSave,
            "asset.load" => Command::AssetLoad,
            _ => Command::Unknown,
        }
    }
}
