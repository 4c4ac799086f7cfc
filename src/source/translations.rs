//! Translation tables.
//!
//! English is built in. Other languages are loaded on demand through a
//! [`TranslationProvider`] and cached per language code. Lookups fall back
//! from the active table to English and finally to the key itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::data::food::FOOD_DATABASE;
use crate::data::span::ChartSpan;
use crate::error::{Error, Result};

/// A key → text table for one language.
pub type StringTable = HashMap<String, String>;

/// The built-in language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language codes with a translation table.
pub const SUPPORTED_LANGUAGES: [&str; 21] = [
    "fr", "en", "de", "es", "it", "pt", "nl", "pl", "ru", "zh", "ja", "ko", "ar", "hi", "tr", "sv",
    "da", "nb", "fi", "cs", "uk",
];

const ENGLISH: &[(&str, &str)] = &[
    ("disconnected", "Disconnected"),
    ("idle", "Idle"),
    ("cooking", "Cooking"),
    ("done", "Done"),
    ("connect_probe", "Connect the probe"),
    ("disconnect_since", "Probe disconnected"),
    ("elapsed", "Elapsed"),
    ("remaining", "Remaining"),
    ("started_at", "Started at"),
    ("ends_at", "Ends at"),
    ("target_temp", "Target temperature"),
    ("compensation", "Carryover compensation"),
    ("compensation_help_title", "Carryover compensation"),
    (
        "compensation_help_text",
        "Meat keeps cooking after it leaves the heat.\nWith compensation on, the cook ends at the withdrawal temperature so the core reaches the desired temperature while resting.",
    ),
    ("close", "Close"),
    ("heating_rate", "Heating rate"),
    ("ambient_temp", "Ambient"),
    ("start", "Start"),
    ("stop", "Stop"),
    ("probe", "Probe"),
    ("target", "Target"),
    ("projection", "Projection"),
    ("ambient", "Ambient"),
    ("category_manual", "Manual"),
    ("food_manual", "Manual"),
    ("doneness_manual", "Manual"),
    ("category_beef", "Beef"),
    ("category_pork", "Pork"),
    ("category_poultry", "Poultry"),
    ("category_lamb", "Lamb"),
    ("category_veal", "Veal"),
    ("category_fish", "Fish"),
    ("category_game", "Game"),
    ("category_other", "Other"),
];

/// Resolve the two-letter language code to use for a raw locale.
///
/// ```
/// use cooker_card::source::translations::resolve_language;
///
/// assert_eq!(resolve_language(Some("fr-FR")), "fr");
/// assert_eq!(resolve_language(Some("xx")), "en");
/// assert_eq!(resolve_language(None), "en");
/// ```
pub fn resolve_language(raw: Option<&str>) -> &'static str {
    let code: String = raw.unwrap_or_default().chars().take(2).collect();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| **l == code.to_lowercase())
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Translation key of a category label.
pub fn category_key(category: &str) -> String {
    format!("category_{}", category)
}

/// Translation key of a food label.
pub fn food_key(category: &str, food: &str) -> String {
    format!("food_{}_{}", category, food)
}

/// Translation key of a doneness label.
pub fn doneness_key(doneness: &str) -> String {
    format!("doneness_{}", doneness)
}

fn humanize(id: &str) -> String {
    let spaced = id.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The built-in English table.
pub fn english() -> StringTable {
    let mut table: StringTable = ENGLISH
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for span in ChartSpan::options() {
        table.insert(span.label_key(), span.label());
    }

    for category in FOOD_DATABASE {
        for food in category.foods {
            table.insert(food_key(category.id, food.id), humanize(food.id));
            for doneness in food.doneness {
                table
                    .entry(doneness_key(doneness.id))
                    .or_insert_with(|| humanize(doneness.id));
            }
        }
    }

    table
}

/// Loader for non-built-in translation tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Load the table for a language code.
    async fn load_language(&self, code: &str) -> Result<StringTable>;
}

#[derive(Debug)]
struct TranslationState {
    language: String,
    cache: HashMap<String, Arc<StringTable>>,
}

/// Shared, cached translation tables with an active language.
///
/// Cloning is cheap; clones share the same cache.
#[derive(Debug, Clone)]
pub struct Translations {
    english: Arc<StringTable>,
    state: Arc<RwLock<TranslationState>>,
}

impl Default for Translations {
    fn default() -> Self {
        Self::new()
    }
}

impl Translations {
    /// Create a cache holding only the built-in English table.
    pub fn new() -> Self {
        let english = Arc::new(english());
        let mut cache = HashMap::new();
        cache.insert(DEFAULT_LANGUAGE.to_string(), english.clone());

        Self {
            english,
            state: Arc::new(RwLock::new(TranslationState {
                language: DEFAULT_LANGUAGE.to_string(),
                cache,
            })),
        }
    }

    /// The active language code.
    pub fn language(&self) -> String {
        self.state.read().language.clone()
    }

    /// Check if a language table is cached.
    pub fn is_cached(&self, code: &str) -> bool {
        self.state.read().cache.contains_key(code)
    }

    /// Add a table to the cache.
    pub fn insert(&self, code: &str, table: StringTable) {
        self.state
            .write()
            .cache
            .insert(code.to_string(), Arc::new(table));
    }

    /// Make a cached language active.
    ///
    /// Returns `false` (and keeps the current language) if the table is not
    /// cached.
    pub fn activate(&self, code: &str) -> bool {
        let mut state = self.state.write();
        if !state.cache.contains_key(code) {
            return false;
        }
        if state.language != code {
            info!("Switching translations to '{}'", code);
            state.language = code.to_string();
        }
        true
    }

    /// Load a language into the cache if it is not already there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TranslationLoad`] if the provider fails. The cache
    /// is left unchanged.
    pub async fn load(&self, provider: &dyn TranslationProvider, code: &str) -> Result<()> {
        if self.is_cached(code) {
            debug!("Using cached '{}' translations", code);
            return Ok(());
        }

        debug!("Loading '{}' translations", code);
        match provider.load_language(code).await {
            Ok(table) => {
                self.insert(code, table);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load '{}' translations: {}", code, e);
                Err(Error::TranslationLoad {
                    language: code.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Translate a key: active table, then English, then the key itself.
    pub fn t(&self, key: &str) -> String {
        let state = self.state.read();
        let text = state
            .cache
            .get(&state.language)
            .and_then(|table| table.get(key))
            .filter(|text| !text.is_empty())
            .or_else(|| self.english.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string());
        text
    }
}
