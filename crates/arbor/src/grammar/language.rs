use super::table::GrammarTable;
use crate::error::GrammarLoadError;
use crate::lexer::ExternalScanner;
use std::fmt;
use std::sync::Arc;

/// Creates a fresh external scanner for each parser
pub type ScannerFactory = fn() -> Box<dyn ExternalScanner>;

/// A loaded grammar plus its optional external scanner.
///
/// Cheap to clone and safe to share across threads; every parser and tree
/// for the language points at the same table.
#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

struct LanguageInner {
    table: GrammarTable,
    scanner: Option<ScannerFactory>,
}

impl Language {
    #[must_use]
    pub fn new(table: GrammarTable) -> Self {
        Self {
            inner: Arc::new(LanguageInner {
                table,
                scanner: None,
            }),
        }
    }

    #[must_use]
    pub fn with_scanner(table: GrammarTable, scanner: ScannerFactory) -> Self {
        Self {
            inner: Arc::new(LanguageInner {
                table,
                scanner: Some(scanner),
            }),
        }
    }

    /// Load a compiled grammar that needs no external scanner
    pub fn load(bytes: &[u8]) -> Result<Self, GrammarLoadError> {
        GrammarTable::load(bytes).map(Self::new)
    }

    #[must_use]
    pub fn table(&self) -> &GrammarTable {
        &self.inner.table
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.table.name()
    }

    /// A new scanner instance, if the language has one
    #[must_use]
    pub fn create_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.inner.scanner.map(|factory| factory())
    }

    /// Whether both handles share the same table
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("states", &self.table().state_count())
            .field("symbols", &self.table().symbol_count())
            .field("external_scanner", &self.inner.scanner.is_some())
            .finish()
    }
}
