//! Quote identifiers, quotes, and the in-memory catalog.
//!
//! The catalog source is a JSON array of `{id?, text, author?}` objects. An
//! explicit `id` (string or number) wins; otherwise the zero-based position,
//! stringified, becomes the identifier. Positions are therefore only stable
//! as long as the catalog file keeps its order.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ErrorCode;

/// Stable string identifier for a quote.
///
/// Numeric and string ids from the catalog normalize to the same form, so
/// `QuoteId::from(7_u64)` and `QuoteId::from("7")` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Identifier derived from a zero-based catalog position.
    #[must_use]
    pub fn from_position(position: usize) -> Self {
        Self(position.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QuoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for QuoteId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<u64> for QuoteId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&QuoteId> for QuoteId {
    fn from(value: &QuoteId) -> Self {
        value.clone()
    }
}

/// A single quote. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: Option<String>,
}

impl Quote {
    /// Attribution line as shown under the quote (`- Author`).
    #[must_use]
    pub fn attribution(&self) -> Option<String> {
        self.author
            .as_deref()
            .filter(|author| !author.is_empty())
            .map(|author| format!("- {author}"))
    }

    /// Text used when sharing the quote: body, newline, attribution, trimmed.
    #[must_use]
    pub fn share_text(&self) -> String {
        let attribution = self.attribution().unwrap_or_default();
        format!("{}\n{}", self.text, attribution).trim().to_string()
    }
}

/// Errors raised while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read quote catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse quote catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::CatalogUnavailable,
            Self::Parse(_) => ErrorCode::CatalogParseError,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    /// Canonical text of the id. Integral floats lose their fraction, so
    /// `1.0` and `1` name the same quote.
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number
                .as_u64()
                .map(|n| n.to_string())
                .or_else(|| number.as_i64().map(|n| n.to_string()))
                .or_else(|| number.as_f64().map(|f| f.to_string()))
                .unwrap_or_else(|| number.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author: Option<String>,
}

/// Ordered, immutable list of quotes with identifier lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteCatalog {
    quotes: Vec<Quote>,
}

impl QuoteCatalog {
    /// Build a catalog from already-normalized quotes.
    #[must_use]
    pub const fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }

    /// Parse the catalog JSON. A JSON `null` is accepted as an empty catalog.
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let raw: Option<Vec<RawQuote>> = serde_json::from_str(content)?;
        let quotes = raw
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(position, quote)| Quote {
                id: quote.id.map_or_else(
                    || QuoteId::from_position(position),
                    |id| QuoteId::from(id.into_text()),
                ),
                text: quote.text,
                author: quote.author,
            })
            .collect();
        Ok(Self { quotes })
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        info!(path = %path.display(), count = catalog.len(), "loaded quote catalog");
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Quote> {
        self.quotes.get(position)
    }

    /// Look a quote up by identifier.
    #[must_use]
    pub fn find(&self, id: &QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|quote| &quote.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter()
    }
}

/// Lazily loaded, memoized catalog.
///
/// The first successful load is kept for the lifetime of the cache; failed
/// loads are not memoized so a later call can retry.
#[derive(Debug)]
pub struct CatalogCache {
    path: PathBuf,
    loaded: OnceCell<QuoteCatalog>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceCell::new(),
        }
    }

    /// Cache that is already populated.
    #[must_use]
    pub fn preloaded(catalog: QuoteCatalog) -> Self {
        let loaded = OnceCell::new();
        let _ = loaded.set(catalog);
        Self {
            path: PathBuf::new(),
            loaded,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The catalog if it has been loaded already.
    #[must_use]
    pub fn loaded(&self) -> Option<&QuoteCatalog> {
        self.loaded.get()
    }

    /// Return the catalog, loading it on first use.
    pub fn get_or_load(&self) -> Result<&QuoteCatalog, CatalogError> {
        if let Some(catalog) = self.loaded.get() {
            return Ok(catalog);
        }
        debug!(path = %self.path.display(), "loading quote catalog");
        let catalog = QuoteCatalog::load(&self.path)?;
        Ok(self.loaded.get_or_init(|| catalog))
    }
}
