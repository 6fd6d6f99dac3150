//! Lookup from internal language codes to MOSS language identifiers.

use std::collections::HashMap;

use crate::config::LanguageConfig;

/// Immutable language table, built once from configuration.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    by_code: HashMap<String, LanguageConfig>,
}

impl LanguageRegistry {
    pub fn new(languages: &[LanguageConfig]) -> Self {
        let by_code = languages
            .iter()
            .map(|l| (l.code.clone(), l.clone()))
            .collect();
        Self { by_code }
    }

    /// Returns the identifier MOSS expects for `code`, or `None` when the
    /// code is not registered.
    pub fn moss_language(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(|l| l.moss_name.as_str())
    }

    pub fn get(&self, code: &str) -> Option<&LanguageConfig> {
        self.by_code.get(code)
    }

    /// Reverse lookup from a readable name ("Python") to its code ("PY").
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.by_code
            .values()
            .find(|l| l.name == name)
            .map(|l| l.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(&crate::config::schema::default_languages())
    }
}
