//! Process-wide cache of loaded languages.
//!
//! Loading validates and expands a table, so it is done once per language
//! and the result is shared. Publication is first-wins: a language is fully
//! built before it is inserted, and when two threads race to load the same
//! name both end up holding the first value published.

use super::language::Language;
use compact_str::CompactString;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct LanguageRegistry {
    languages: RwLock<HashMap<CompactString, Language, ahash::RandomState>>,
}

static GLOBAL: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry, created on first use
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Language> {
        self.languages.read().get(name).cloned()
    }

    /// Publish `language` under its own name unless that name is taken.
    /// Returns whichever language ends up registered.
    pub fn register(&self, language: Language) -> Language {
        let mut languages = self.languages.write();
        let published = languages
            .entry(CompactString::from(language.name()))
            .or_insert_with(|| {
                debug!(language = language.name(), "published language");
                language.clone()
            });
        published.clone()
    }

    /// Return the language registered as `name`, loading and publishing it
    /// first if needed. The loader runs without holding the lock, so it may
    /// run more than once under contention; only the first result is kept.
    pub fn get_or_load<E>(
        &self,
        name: &str,
        load: impl FnOnce() -> Result<Language, E>,
    ) -> Result<Language, E> {
        if let Some(language) = self.get(name) {
            return Ok(language);
        }
        let language = load()?;
        let mut languages = self.languages.write();
        Ok(languages
            .entry(CompactString::from(name))
            .or_insert_with(|| {
                debug!(language = name, "published language");
                language
            })
            .clone())
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<CompactString> {
        let mut names: Vec<_> = self.languages.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.languages.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.languages.read().is_empty()
    }
}
