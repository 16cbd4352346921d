//! Column normalizer: raw feed tables to canonical rows.
//!
//! Every feed is described declaratively by a [`FeedSchema`]: the ordered
//! `(source name, canonical name)` pairs the canonical table needs, plus a
//! [`HeaderStrategy`] saying whether the file's own header can be trusted.
//! The margin file's header arrives garbled, so its schema carries a fixed
//! positional template and the column count is validated before any
//! position is trusted. Resolution either yields an index per canonical
//! column or a [`SchemaMismatch`]; it never panics on a malformed file.
//!
//! Per-feed conversion lives in [`price`], [`financial`] and [`margin`].

pub mod financial;
pub mod margin;
pub mod price;
pub mod values;

use indexmap::IndexMap;
use thiserror::Error;

use crate::models::{feed::FeedKind, raw_table::RawTable};

pub use financial::normalize_financials;
pub use margin::normalize_margin;
pub use price::normalize_prices;

/// Canonical name of the key column shared by every feed.
pub const KEY_COLUMN: &str = "code";

/// The file's layout could not be mapped onto the canonical schema.
///
/// The caller skips that feed for that date and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaMismatch {
    /// A positional template was expected but the file has a different width.
    #[error("{feed} feed: expected {expected} columns, found {found}")]
    ColumnCount {
        feed: FeedKind,
        expected: usize,
        found: usize,
    },

    /// The `code` column could not be located.
    #[error("{feed} feed: key column `{source_name}` not found in header")]
    MissingKey {
        feed: FeedKind,
        source_name: &'static str,
    },

    /// A non-key column required by the canonical table is absent.
    #[error("{feed} feed: column `{source_name}` (for `{canonical}`) not found in header")]
    MissingColumn {
        feed: FeedKind,
        source_name: &'static str,
        canonical: &'static str,
    },

    /// A date cell is in none of the accepted formats.
    #[error("{feed} feed: row {row}: unrecognised date {value:?}")]
    DateFormat {
        feed: FeedKind,
        row: usize,
        value: String,
    },
}

/// One `(source name → canonical name)` entry of a feed dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    /// Header text as published by the provider.
    pub source: &'static str,
    /// Canonical column name.
    pub canonical: &'static str,
    /// Whether resolution fails when the column is absent.
    pub required: bool,
}

impl ColumnMap {
    /// A column the canonical table cannot be built without.
    pub const fn required(source: &'static str, canonical: &'static str) -> Self {
        Self {
            source,
            canonical,
            required: true,
        }
    }

    /// A column that is read when present.
    pub const fn optional(source: &'static str, canonical: &'static str) -> Self {
        Self {
            source,
            canonical,
            required: false,
        }
    }
}

/// How the header names of a feed are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// Use the header row of the file.
    ByName,
    /// Ignore the file's header; names are assigned by position from a fixed
    /// template, and only when the widths agree.
    Positional { template: &'static [&'static str] },
}

/// Declarative description of one feed's layout.
#[derive(Debug, Clone, Copy)]
pub struct FeedSchema {
    /// Feed this schema belongs to.
    pub kind: FeedKind,
    /// Where header names come from.
    pub header: HeaderStrategy,
    /// Dictionary in canonical-table order.
    pub columns: &'static [ColumnMap],
}

/// Canonical column name to raw cell index, produced by [`FeedSchema::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    indices: IndexMap<&'static str, usize>,
}

impl ResolvedColumns {
    /// Index of `canonical` in the raw rows, if it was resolved.
    pub fn index_of(&self, canonical: &str) -> Option<usize> {
        self.indices.get(canonical).copied()
    }

    /// Raw cell of `canonical` in `row`; empty when the column is unresolved
    /// or the row is too short.
    pub fn cell<'r>(&self, row: &'r [String], canonical: &str) -> &'r str {
        self.index_of(canonical)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Resolved canonical names in canonical order.
    pub fn canonical_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.indices.keys().copied()
    }
}

impl FeedSchema {
    /// Maps the table's header onto this schema.
    pub fn resolve(&self, table: &RawTable) -> Result<ResolvedColumns, SchemaMismatch> {
        let header: Vec<&str> = match self.header {
            HeaderStrategy::ByName => table.columns.iter().map(|c| clean_header(c)).collect(),
            HeaderStrategy::Positional { template } => {
                if table.column_count() != template.len() {
                    return Err(SchemaMismatch::ColumnCount {
                        feed: self.kind,
                        expected: template.len(),
                        found: table.column_count(),
                    });
                }
                template.to_vec()
            }
        };

        let mut indices = IndexMap::with_capacity(self.columns.len());
        for col in self.columns {
            match header.iter().position(|h| *h == col.source) {
                Some(i) => {
                    indices.insert(col.canonical, i);
                }
                None if col.canonical == KEY_COLUMN => {
                    return Err(SchemaMismatch::MissingKey {
                        feed: self.kind,
                        source_name: col.source,
                    });
                }
                None if col.required => {
                    return Err(SchemaMismatch::MissingColumn {
                        feed: self.kind,
                        source_name: col.source,
                        canonical: col.canonical,
                    });
                }
                None => {}
            }
        }

        Ok(ResolvedColumns { indices })
    }
}

fn clean_header(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim()
}

/// Trimmed security code, or `None` for a blank cell.
///
/// Codes stay text so that leading zeros and alphanumeric codes ("130A")
/// survive untouched.
pub(crate) fn normalize_code(cell: &str) -> Option<String> {
    let code = cell.trim();
    (!code.is_empty()).then(|| code.to_string())
}
