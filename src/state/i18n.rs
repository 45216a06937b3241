use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    ZhHant,
}

impl Language {
    pub fn all() -> &'static [Self] {
        &[Self::En, Self::ZhHant]
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhHant => "zh-Hant",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().iter().copied().find(|lang| lang.code() == code)
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::En => "language.option.en",
            Self::ZhHant => "language.option.zh_hant",
        }
    }

    fn catalog_source(self) -> &'static str {
        match self {
            Self::En => include_str!("../../assets/i18n/en.json"),
            Self::ZhHant => include_str!("../../assets/i18n/zh-Hant.json"),
        }
    }
}

type Catalog = BTreeMap<String, String>;

/// Looks up a UI string, falling back to English and then to the key.
pub fn tr(language: Language, key: &'static str) -> &'static str {
    lookup(language, key)
        .or_else(|| lookup(Language::En, key))
        .unwrap_or(key)
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    catalog(language).get(key).map(String::as_str)
}

fn catalog(language: Language) -> &'static Catalog {
    static EN: OnceLock<Catalog> = OnceLock::new();
    static ZH_HANT: OnceLock<Catalog> = OnceLock::new();

    let cell = match language {
        Language::En => &EN,
        Language::ZhHant => &ZH_HANT,
    };
    cell.get_or_init(|| {
        serde_json::from_str(language.catalog_source()).unwrap_or_else(|err| {
            log::error!("i18n catalog '{}' is invalid: {err}", language.code());
            Catalog::new()
        })
    })
}
