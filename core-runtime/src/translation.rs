//! Translation string table.
//!
//! The companion owns the locale files. The table is fetched once per init
//! for the configured locale and swapped in whole.

use crate::error::Result;
use bridge_traits::BridgeClient;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Localized strings for the user's locale.
#[derive(Debug)]
pub struct Translations {
    locale: RwLock<String>,
    strings: RwLock<Arc<HashMap<String, String>>>,
}

impl Translations {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: RwLock::new(locale.into()),
            strings: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    pub fn locale(&self) -> String {
        self.locale.read().clone()
    }

    /// Changes the locale. The loaded table is kept until the next load.
    pub fn set_locale(&self, locale: impl Into<String>) {
        *self.locale.write() = locale.into();
    }

    /// Replaces the whole table.
    pub fn replace(&self, strings: HashMap<String, String>) {
        *self.strings.write() = Arc::new(strings);
    }

    /// Fetches the table for the current locale from the companion.
    ///
    /// Returns the number of strings loaded. On failure the previous table
    /// stays in place.
    pub async fn load_from_bridge(&self, bridge: &dyn BridgeClient) -> Result<usize> {
        let locale = self.locale();
        let strings = bridge.fetch_translations(&locale).await?;
        let count = strings.len();
        self.replace(strings);
        debug!(locale = %locale, count, "Translations loaded");
        Ok(count)
    }

    /// Looks up `key`, falling back to the key itself.
    pub fn get(&self, key: &str) -> String {
        self.strings
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Looks up `key` and substitutes `{name}` placeholders.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.get(key), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }

    pub fn is_loaded(&self) -> bool {
        !self.strings.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.strings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_loaded()
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOCALE)
    }
}
