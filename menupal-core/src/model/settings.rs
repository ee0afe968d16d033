use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Chinese,
        Language::English,
        Language::Japanese,
        Language::Korean,
    ];

    /// Code sent upstream as `target_language`.
    pub fn code(self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
            Language::Japanese => "ja",
            Language::Korean => "ko",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::Chinese => "中文",
            Language::English => "English",
            Language::Japanese => "日本語",
            Language::Korean => "한국어",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cny,
    Usd,
    Jpy,
    Krw,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Cny,
        Currency::Usd,
        Currency::Jpy,
        Currency::Krw,
        Currency::Eur,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Cny => "CNY",
            Currency::Usd => "USD",
            Currency::Jpy => "JPY",
            Currency::Krw => "KRW",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Cny | Currency::Jpy => "¥",
            Currency::Usd => "$",
            Currency::Krw => "₩",
            Currency::Eur => "€",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Currency::Cny => "人民币 (CNY)",
            Currency::Usd => "美元 (USD)",
            Currency::Jpy => "日元 (JPY)",
            Currency::Krw => "韩元 (KRW)",
            Currency::Eur => "欧元 (EUR)",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserSettings {
    #[serde(default)]
    pub preferred_language: Language,

    #[serde(default)]
    pub currency: Currency,
}
